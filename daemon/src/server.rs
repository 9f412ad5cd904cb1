//! Command dispatch: maps decoded requests onto the collector, sampler
//! and signal action, producing finished wire replies.

use crate::collector::{LinuxProcessCollector, ProcessCollector};
use crate::config::Config;
use crate::executor;
use crate::protocol::{self, Request};
use crate::sampler::SystemSampler;
use crate::socket::RequestHandler;
use tokio::sync::Mutex;
use tracing::{error, warn};

pub struct DaemonState {
    collector: LinuxProcessCollector,
    // The CPU and network baselines are shared across connections, so every
    // client sees one rate stream. The lock covers the whole
    // read-compute-update cycle of a sampling call.
    sampler: Mutex<SystemSampler>,
}

impl DaemonState {
    pub fn new(config: &Config) -> Self {
        Self {
            collector: LinuxProcessCollector::new(),
            sampler: Mutex::new(SystemSampler::new(config.metrics.disk_mount.clone())),
        }
    }
}

#[async_trait::async_trait]
impl RequestHandler for DaemonState {
    async fn handle(&self, request: Request) -> String {
        match request {
            Request::GetProcesses => match self.collector.list_processes() {
                Ok(processes) => protocol::format_process_list(&processes),
                Err(e) => {
                    // Scan failure renders as an empty list on the wire;
                    // the distinction only matters server-side.
                    error!("Process scan failed: {}", e);
                    protocol::format_process_list(&[])
                }
            },

            Request::GetCpuStats => {
                let mut sampler = self.sampler.lock().await;
                match sampler.cpu_stats() {
                    Ok(stats) => protocol::format_cpu(&stats),
                    Err(e) => {
                        error!("CPU sample failed: {}", e);
                        protocol::ERR_CPU.to_string()
                    }
                }
            }

            Request::GetMemStats => {
                let sampler = self.sampler.lock().await;
                match sampler.mem_stats() {
                    Ok(stats) => protocol::format_mem(&stats),
                    Err(e) => {
                        error!("Memory sample failed: {}", e);
                        protocol::ERR_MEM.to_string()
                    }
                }
            }

            Request::GetNetStats => {
                let mut sampler = self.sampler.lock().await;
                match sampler.net_stats() {
                    Ok(stats) => protocol::format_net(&stats),
                    Err(e) => {
                        error!("Network sample failed: {}", e);
                        protocol::ERR_NET.to_string()
                    }
                }
            }

            Request::GetDiskStats => {
                let sampler = self.sampler.lock().await;
                match sampler.disk_stats() {
                    Ok(stats) => protocol::format_disk(&stats),
                    Err(e) => {
                        error!("Disk sample failed: {}", e);
                        protocol::ERR_DISK.to_string()
                    }
                }
            }

            Request::Kill { pid, signal } => match executor::send_signal(pid, signal) {
                Ok(()) => protocol::REPLY_OK.to_string(),
                Err(e) => {
                    warn!("kill({}, {}) failed: {}", pid, signal, e);
                    protocol::ERR_KILL_FAILED.to_string()
                }
            },
        }
    }
}
