use super::{ProcessCollector, ProcessRecord};
use std::ffi::CStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Fields recovered from one `/proc/<pid>/stat` record.
#[derive(Debug, Clone, PartialEq)]
pub struct StatRecord {
    pub pid: u32,
    pub name: String,
    pub state: char,
    pub ppid: i32,
    pub cpu_ticks_total: u64,
}

/// Parse the single-line `/proc/<pid>/stat` record.
///
/// The command name sits in parentheses and may itself contain `)`, so the
/// last close-paren in the line is the authoritative boundary. Field
/// positions after it are fixed: state, ppid, then utime/stime at offsets
/// 11 and 12 (fields 14 and 15 of the full record).
pub fn parse_stat(line: &str) -> Option<StatRecord> {
    let lparen = line.find('(')?;
    let rparen = line.rfind(')')?;
    if rparen < lparen {
        return None;
    }

    let pid: u32 = line[..lparen].trim().parse().ok()?;
    let name = line[lparen + 1..rparen].to_string();

    let rest: Vec<&str> = line[rparen + 1..].split_whitespace().collect();
    if rest.len() < 13 {
        return None;
    }
    let state = rest[0].chars().next()?;
    let ppid: i32 = rest[1].parse().ok()?;
    let utime: u64 = rest[11].parse().ok()?;
    let stime: u64 = rest[12].parse().ok()?;

    Some(StatRecord {
        pid,
        name,
        state,
        ppid,
        cpu_ticks_total: utime + stime,
    })
}

/// Owner uid and resident set size scanned out of `/proc/<pid>/status`.
/// Either field may be absent (kernel threads have no VmRSS line).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusRecord {
    pub uid: Option<u32>,
    pub resident_kb: u64,
}

pub fn parse_status(content: &str) -> StatusRecord {
    let mut record = StatusRecord::default();
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("Uid:") {
            record.uid = rest.split_whitespace().next().and_then(|t| t.parse().ok());
        } else if let Some(rest) = line.strip_prefix("VmRSS:") {
            record.resident_kb = rest
                .split_whitespace()
                .next()
                .and_then(|t| t.parse().ok())
                .unwrap_or(0);
        }
    }
    record
}

/// Resolve a uid to a user name, falling back to the decimal uid as text.
/// Never errors; a missing passwd entry is a normal condition.
pub fn resolve_owner(uid: u32) -> String {
    lookup_user(uid).unwrap_or_else(|| uid.to_string())
}

fn lookup_user(uid: u32) -> Option<String> {
    let mut buf_size = 1024usize;
    let max_buf_size = 65536usize;

    loop {
        let mut buf: Vec<u8> = vec![0; buf_size];
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::passwd = std::ptr::null_mut();

        let ret = unsafe {
            libc::getpwuid_r(
                uid,
                &mut pwd,
                buf.as_mut_ptr() as *mut libc::c_char,
                buf_size,
                &mut result,
            )
        };

        if ret == libc::ERANGE && buf_size < max_buf_size {
            buf_size *= 2;
            continue;
        }
        if ret != 0 || result.is_null() {
            return None;
        }

        let name_ptr = pwd.pw_name;
        if name_ptr.is_null() {
            return None;
        }
        let name = unsafe { CStr::from_ptr(name_ptr).to_string_lossy().into_owned() };
        return Some(name);
    }
}

pub struct LinuxProcessCollector {
    proc_root: PathBuf,
}

impl LinuxProcessCollector {
    pub fn new() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
        }
    }

    fn snapshot(&self, pid_dir: &Path) -> Option<ProcessRecord> {
        // Either file disappearing means the process exited mid-scan;
        // the caller skips the entry rather than reporting partial data.
        let stat_content = fs::read_to_string(pid_dir.join("stat")).ok()?;
        let stat = parse_stat(&stat_content)?;

        let status_content = fs::read_to_string(pid_dir.join("status")).ok()?;
        let status = parse_status(&status_content);

        let owner = match status.uid {
            Some(uid) => resolve_owner(uid),
            None => String::from("?"),
        };

        Some(ProcessRecord {
            pid: stat.pid,
            ppid: stat.ppid,
            owner,
            state: stat.state,
            name: stat.name,
            cpu_ticks_total: stat.cpu_ticks_total,
            resident_kb: status.resident_kb,
        })
    }
}

impl Default for LinuxProcessCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessCollector for LinuxProcessCollector {
    fn list_processes(&self) -> io::Result<Vec<ProcessRecord>> {
        let entries = fs::read_dir(&self.proc_root)?;
        let mut processes = Vec::new();
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name.parse::<u32>().is_ok() {
                if let Some(record) = self.snapshot(&entry.path()) {
                    processes.push(record);
                }
            }
        }
        Ok(processes)
    }

    fn get_process(&self, pid: u32) -> Option<ProcessRecord> {
        self.snapshot(&self.proc_root.join(pid.to_string()))
    }
}
