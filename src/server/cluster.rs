//! Master/worker process management.
//!
//! The master re-executes its own binary once per worker with a
//! marker variable in the environment; a child process sees the
//! marker and runs the in-process server directly. `SO_REUSEPORT` on
//! every listener is what lets the siblings share the port. On
//! shutdown the master signals each worker with `SIGTERM` and reaps
//! them; `SIGCHLD` reaping keeps crashed workers from lingering as
//! zombies in between.

use std::env;
use std::io;
use std::process::{Child, Command};
use std::thread;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::server::Server;
use crate::shutdown;

const WORKER_ENV: &str = "TRELLIS_WORKER";
const MASTER_POLL: Duration = Duration::from_millis(100);

/// Whether this process was spawned as a cluster worker.
pub fn is_worker() -> bool {
    env::var_os(WORKER_ENV).is_some()
}

pub(crate) fn run(server: Server) -> io::Result<()> {
    if is_worker() {
        info!(pid = std::process::id(), "cluster worker starting");
        return server.start();
    }

    shutdown::install_handlers();
    shutdown::install_child_reaper();

    let worker_count = server.config().worker_processes();
    let exe = env::current_exe()?;
    let mut workers: Vec<Child> = Vec::with_capacity(worker_count);

    for _ in 0..worker_count {
        match Command::new(&exe).env(WORKER_ENV, "1").spawn() {
            Ok(child) => workers.push(child),
            Err(e) => {
                error!(error = %e, "failed to spawn worker, tearing cluster down");
                terminate(&workers);
                reap(workers);
                return Err(e);
            }
        }
    }

    info!(
        pid = std::process::id(),
        workers = worker_count,
        "cluster master running"
    );

    while !shutdown::requested() {
        thread::sleep(MASTER_POLL);
    }

    info!("cluster master shutting down workers");
    terminate(&workers);
    reap(workers);
    info!("cluster stopped");
    Ok(())
}

/// Send SIGTERM to every worker so each sets its own shutdown flag.
fn terminate(workers: &[Child]) {
    for child in workers {
        let pid = child.id() as libc::pid_t;
        let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
        if rc != 0 {
            warn!(pid, "worker already gone before SIGTERM");
        }
    }
}

fn reap(workers: Vec<Child>) {
    for mut child in workers {
        let _ = child.wait();
    }
}
