//! The server: listeners, acceptor threads, the worker pool and the
//! shutdown path, tied to a root router.

use std::io;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::thread;

use http::Method;
use tracing::info;

use crate::config::ServerConfig;
use crate::middleware::Handler;
use crate::render::RenderEngine;
use crate::router::{GroupBuilder, RouteBuilder, Router};
use crate::server::{acceptor, cluster, queue::HandoffQueue, worker};
use crate::shutdown;

/// Acceptor threads per worker process.
const ACCEPT_THREADS: usize = 4;

/// An HTTP application server: a root [`Router`] plus the
/// configuration its acceptor and worker threads run with.
///
/// Routes are registered up front; [`Server::start`] then freezes the
/// router behind an `Arc` and no registration happens after accept
/// begins.
pub struct Server {
    router: Router,
    config: ServerConfig,
    engine: Option<Arc<dyn RenderEngine>>,
    view_dir: String,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            router: Router::new(),
            config,
            engine: None,
            view_dir: "./views".to_string(),
        }
    }

    /// Attach the template-engine collaborator handed to every
    /// response.
    pub fn set_render_engine(&mut self, engine: Arc<dyn RenderEngine>) {
        self.engine = Some(engine);
    }

    pub fn set_view_dir(&mut self, dir: &str) {
        self.view_dir = dir.to_string();
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The root router, for registration forms the shorthands below
    /// don't cover.
    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub fn route(&mut self, method: Method, path: &str) -> RouteBuilder<'_> {
        self.router.route(method, path)
    }

    pub fn get(&mut self, path: &str) -> RouteBuilder<'_> {
        self.router.get(path)
    }

    pub fn post(&mut self, path: &str) -> RouteBuilder<'_> {
        self.router.post(path)
    }

    pub fn put(&mut self, path: &str) -> RouteBuilder<'_> {
        self.router.put(path)
    }

    pub fn delete(&mut self, path: &str) -> RouteBuilder<'_> {
        self.router.delete(path)
    }

    pub fn group(&mut self, prefix: &str) -> GroupBuilder<'_> {
        self.router.group(prefix)
    }

    pub fn mount(&mut self, prefix: &str, handler: Arc<dyn Handler>) {
        self.router.mount(prefix, handler);
    }

    /// Run this process's acceptors and worker pool. Blocks until the
    /// shutdown flag is observed and every thread has joined.
    pub fn start(self) -> io::Result<()> {
        shutdown::install_handlers();

        let config = self.config;
        let router = Arc::new(self.router);
        let queue = Arc::new(HandoffQueue::new());
        let active = Arc::new(AtomicUsize::new(0));
        let ctx = Arc::new(worker::WorkerContext {
            router,
            engine: self.engine,
            view_dir: self.view_dir,
            active: active.clone(),
            buffer_size: config.buffer_size,
        });

        let mut accept_threads = Vec::with_capacity(ACCEPT_THREADS);
        for i in 0..ACCEPT_THREADS {
            let listener = acceptor::bind_listener(&config)?;
            let queue = queue.clone();
            let active = active.clone();
            let config = config.clone();
            accept_threads.push(
                thread::Builder::new()
                    .name(format!("accept-{i}"))
                    .spawn(move || acceptor::run(listener, queue, active, config))?,
            );
        }

        let mut pool = Vec::with_capacity(config.thread_pool_size);
        for i in 0..config.thread_pool_size {
            let queue = queue.clone();
            let ctx = ctx.clone();
            pool.push(
                thread::Builder::new()
                    .name(format!("worker-{i}"))
                    .spawn(move || worker::run(queue, ctx))?,
            );
        }

        info!(
            port = config.port,
            accept_threads = ACCEPT_THREADS,
            worker_threads = config.thread_pool_size,
            "server accepting connections"
        );

        for handle in accept_threads {
            let _ = handle.join();
        }
        for handle in pool {
            let _ = handle.join();
        }
        info!("server stopped");
        Ok(())
    }

    /// Run the multi-process form: the master forks worker processes
    /// that each call [`Server::start`], then supervises them until
    /// shutdown.
    pub fn start_cluster(self) -> io::Result<()> {
        cluster::run(self)
    }

    /// Ask every loop in this process to wind down.
    pub fn request_shutdown() {
        shutdown::trigger();
    }
}
