//! Process accounting collector (reads /proc on Linux)

pub mod linux;

pub use linux::LinuxProcessCollector;

/// Point-in-time accounting for one process. Built fresh on every scan,
/// never cached between requests.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub ppid: i32,
    pub owner: String,
    pub state: char,
    pub name: String,
    pub cpu_ticks_total: u64,
    pub resident_kb: u64,
}

pub trait ProcessCollector: Send + Sync {
    /// Snapshot every currently enumerable process. `Err` means the process
    /// table itself could not be opened, which is distinct from an empty
    /// list of running processes.
    fn list_processes(&self) -> std::io::Result<Vec<ProcessRecord>>;

    /// Snapshot a single process; `None` if it vanished or is unreadable.
    fn get_process(&self, pid: u32) -> Option<ProcessRecord>;
}
