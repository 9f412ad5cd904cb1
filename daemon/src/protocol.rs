//! Line protocol: command parsing and wire-text formatting

use crate::collector::ProcessRecord;
use crate::sampler::{CpuStats, DiskStats, MemStats, NetStats};

pub const REPLY_OK: &str = "OK\n";
pub const ERR_UNKNOWN_COMMAND: &str = "ERROR;unknown command\n";
pub const ERR_INVALID_KILL_FORMAT: &str = "ERROR;invalid kill format\n";
pub const ERR_KILL_FAILED: &str = "ERROR;kill failed\n";
pub const ERR_CPU: &str = "ERROR;cpu\n";
pub const ERR_MEM: &str = "ERROR;mem\n";
pub const ERR_NET: &str = "ERROR;net\n";
pub const ERR_DISK: &str = "ERROR;disk\n";

/// One client command, decoded from a single line with the terminator
/// already stripped. Commands are case-sensitive ASCII.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    GetProcesses,
    GetCpuStats,
    GetMemStats,
    GetNetStats,
    GetDiskStats,
    Kill { pid: i32, signal: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    UnknownCommand,
    InvalidKillFormat,
}

impl ParseError {
    pub fn reply(self) -> &'static str {
        match self {
            ParseError::UnknownCommand => ERR_UNKNOWN_COMMAND,
            ParseError::InvalidKillFormat => ERR_INVALID_KILL_FORMAT,
        }
    }
}

impl Request {
    pub fn parse(line: &str) -> Result<Request, ParseError> {
        match line {
            "GET_PROCESSES" => return Ok(Request::GetProcesses),
            "GET_CPU_STATS" => return Ok(Request::GetCpuStats),
            "GET_MEM_STATS" => return Ok(Request::GetMemStats),
            "GET_NET_STATS" => return Ok(Request::GetNetStats),
            "GET_DISK_STATS" => return Ok(Request::GetDiskStats),
            _ => {}
        }
        if line.starts_with("KILL") {
            return parse_kill(line);
        }
        Err(ParseError::UnknownCommand)
    }
}

fn parse_kill(line: &str) -> Result<Request, ParseError> {
    let parts: Vec<&str> = line.split(';').collect();
    if parts.len() != 3 || parts[0] != "KILL" {
        return Err(ParseError::InvalidKillFormat);
    }
    let pid: i32 = parts[1].trim().parse().map_err(|_| ParseError::InvalidKillFormat)?;
    let signal: i32 = parts[2].trim().parse().map_err(|_| ParseError::InvalidKillFormat)?;
    Ok(Request::Kill { pid, signal })
}

/// Replace delimiter and control bytes in a free-text field. The protocol
/// has no quoting, so a tab or newline inside a command name would
/// desynchronize every client parser.
pub fn sanitize_field(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Render the `GET_PROCESSES` reply. An empty list renders as the bare
/// begin/end markers, which is a valid reply rather than an error.
pub fn format_process_list(processes: &[ProcessRecord]) -> String {
    let mut out = String::from("BEGIN_PROCESS_LIST\n");
    for p in processes {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            p.pid,
            p.ppid,
            sanitize_field(&p.owner),
            p.state,
            sanitize_field(&p.name),
            p.cpu_ticks_total,
            p.resident_kb,
        ));
    }
    out.push_str("END_PROCESS_LIST\n");
    out
}

pub fn format_cpu(stats: &CpuStats) -> String {
    format!("CPU;{:.1};{}\n", stats.usage_percent, stats.total_ticks)
}

pub fn format_mem(stats: &MemStats) -> String {
    format!(
        "MEM_TOTAL;{}\nMEM_FREE;{}\nMEM_AVAIL;{}\nBUFFERS;{}\nCACHED;{}\nSWAP_TOTAL;{}\nSWAP_FREE;{}\n",
        stats.total_kb,
        stats.free_kb,
        stats.available_kb,
        stats.buffers_kb,
        stats.cached_kb,
        stats.swap_total_kb,
        stats.swap_free_kb,
    )
}

pub fn format_net(stats: &NetStats) -> String {
    format!("NET;{};{};\n", stats.down_bytes, stats.up_bytes)
}

pub fn format_disk(stats: &DiskStats) -> String {
    format!("DISK;{};{}\n", stats.used_bytes, stats.total_bytes)
}
