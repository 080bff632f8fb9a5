//! Pregel Runtime - superstep loop for vertex programs
//!
//! Each superstep runs Send → Gather → Apply → Hook. Every phase walks the
//! vertex partitions in parallel on a dedicated rayon pool; a partition
//! only writes the slots of the vertices it owns. Messages of superstep
//! `t` are produced from the values as they stood at the end of `t - 1`,
//! and no apply starts before every gather has finished.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::config::PregelConfig;
use super::error::PregelError;
use super::graph::Graph;
use super::program::{ActivityPolicy, Iterations, VertexProgram};
use super::vertex::{VertexId, VertexState};

/// Counters of a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Supersteps executed
    pub supersteps: usize,
    /// Sum over supersteps of the vertices that sent a message
    pub senders: u64,
    /// Whether the last superstep sent nothing or the active set emptied
    pub converged: bool,
    /// Wall time spent in the superstep loop
    pub elapsed: Duration,
}

/// Program, graph and counters handed back by [`PregelRuntime::run`]
#[derive(Debug)]
pub struct RunOutcome<P: VertexProgram> {
    pub program: P,
    pub graph: Graph<P::Value>,
    pub stats: RunStats,
}

/// BSP engine bound to a fixed-size worker pool
#[derive(Debug, Clone)]
pub struct PregelRuntime {
    /// Configuration for the runtime
    config: PregelConfig,
    /// Threads that execute superstep phases
    pool: Arc<rayon::ThreadPool>,
}

impl PregelRuntime {
    /// Create a new runtime with default configuration
    pub fn new() -> Result<Self, PregelError> {
        Self::with_config(PregelConfig::default())
    }

    /// Create a new runtime with custom configuration
    pub fn with_config(config: PregelConfig) -> Result<Self, PregelError> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallelism)
            .thread_name(|i| format!("bsp-worker-{i}"))
            .build()
            .map_err(|e| PregelError::config_error(format!("failed to start worker pool: {e}")))?;

        Ok(Self {
            config,
            pool: Arc::new(pool),
        })
    }

    pub fn config(&self) -> &PregelConfig {
        &self.config
    }

    /// Run `program` over `graph` on a blocking worker
    ///
    /// Enforces the configured `run_timeout`. On timeout the loop is asked
    /// to stop at the next superstep boundary and `RunTimeout` is returned
    /// right away. A panic inside a vertex program becomes `EnginePanic`.
    pub async fn run<P>(
        &self,
        program: P,
        graph: Graph<P::Value>,
        iterations: Iterations,
    ) -> Result<RunOutcome<P>, PregelError>
    where
        P: VertexProgram + 'static,
        P::Value: 'static,
    {
        let run_timeout = self.config.run_timeout;
        let name = program.name();
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let runtime = self.clone();

        let handle = tokio::task::spawn_blocking(move || {
            let mut program = program;
            let mut graph = graph;
            let stats = runtime.pool.install(|| {
                runtime.execute(&mut program, &mut graph, iterations, &flag)
            })?;
            Ok(RunOutcome {
                program,
                graph,
                stats,
            })
        });

        match timeout(run_timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                let message = if join_error.is_panic() {
                    panic_message(join_error.into_panic())
                } else {
                    join_error.to_string()
                };
                Err(PregelError::engine_panic(name, message))
            }
            Err(_) => {
                cancel.store(true, Ordering::Relaxed);
                warn!(program = name, timeout = ?run_timeout, "Run timed out, cancelling");
                Err(PregelError::RunTimeout(run_timeout))
            }
        }
    }

    /// Run on the calling thread's behalf, blocking until done
    ///
    /// No timeout applies; a panic in the program propagates to the caller.
    pub fn run_blocking<P: VertexProgram>(
        &self,
        program: &mut P,
        graph: &mut Graph<P::Value>,
        iterations: Iterations,
    ) -> Result<RunStats, PregelError> {
        let never = AtomicBool::new(false);
        self.pool
            .install(|| self.execute(program, graph, iterations, &never))
    }

    /// Superstep loop
    fn execute<P: VertexProgram>(
        &self,
        program: &mut P,
        graph: &mut Graph<P::Value>,
        iterations: Iterations,
        cancel: &AtomicBool,
    ) -> Result<RunStats, PregelError> {
        let started = Instant::now();
        let policy = program.activity();
        let mut stats = RunStats::default();

        info!(
            program = program.name(),
            vertices = graph.vertex_count(),
            edges = graph.topology.edge_count(),
            partitions = graph.topology.partitions(),
            ?iterations,
            "Starting run"
        );

        program.on_start(&mut graph.pass());

        loop {
            let superstep = stats.supersteps;

            if let Iterations::Fixed(n) = iterations {
                if superstep >= n {
                    break;
                }
            }

            if cancel.load(Ordering::Relaxed) {
                return Err(PregelError::Cancelled);
            }

            if policy == ActivityPolicy::ActiveOnly && graph.active_count() == 0 {
                stats.converged = true;
                break;
            }

            if iterations == Iterations::UntilConverged && superstep >= self.config.max_supersteps
            {
                return Err(PregelError::MaxSuperstepsExceeded(superstep));
            }

            let step_started = Instant::now();
            let senders = superstep_once(program, graph);
            program.on_superstep_end(superstep, &mut graph.pass());

            stats.supersteps += 1;
            stats.senders += senders;
            stats.converged = senders == 0
                || (policy == ActivityPolicy::ActiveOnly && graph.active_count() == 0);

            if self.config.tracing_enabled {
                debug!(
                    program = program.name(),
                    superstep,
                    senders,
                    elapsed = ?step_started.elapsed(),
                    "Superstep complete"
                );
            }

            if stats.converged && iterations == Iterations::UntilConverged {
                break;
            }
        }

        stats.elapsed = started.elapsed();
        info!(
            program = program.name(),
            supersteps = stats.supersteps,
            converged = stats.converged,
            elapsed = ?stats.elapsed,
            "Run finished"
        );
        Ok(stats)
    }
}

/// One superstep; returns how many vertices sent a message
fn superstep_once<P: VertexProgram>(program: &P, graph: &mut Graph<P::Value>) -> u64 {
    let n = graph.vertex_count();
    let block = graph.topology.partition_len();
    let policy = program.activity();
    let direction = program.direction();

    // Send
    let mut outbox: Vec<Option<P::Message>> = Vec::with_capacity(n);
    outbox.resize_with(n, || None);
    outbox
        .par_chunks_mut(block)
        .zip(graph.values.par_chunks(block))
        .zip(graph.states.par_chunks(block))
        .for_each(|((slots, values), states)| {
            for ((slot, value), state) in slots.iter_mut().zip(values).zip(states) {
                if policy == ActivityPolicy::AllVertices || state.is_active() {
                    *slot = program.send_message(value);
                }
            }
        });

    let senders = outbox.par_iter().filter(|m| m.is_some()).count() as u64;
    if senders == 0 {
        graph.states.fill(VertexState::Halted);
        return 0;
    }

    // Gather: process + reduce per destination, in incoming-edge order
    let topology = &graph.topology;
    let values = &graph.values;
    let mut inbox: Vec<Option<P::Reduced>> = Vec::with_capacity(n);
    inbox.resize_with(n, || None);
    inbox
        .par_chunks_mut(block)
        .enumerate()
        .for_each(|(partition, slots)| {
            let base = partition * block;
            for (offset, slot) in slots.iter_mut().enumerate() {
                let v = VertexId((base + offset) as u32);
                let destination = &values[v.index()];
                let mut total: Option<P::Reduced> = None;
                for (sender, weight) in topology.incoming(v, direction) {
                    if let Some(message) = &outbox[sender.index()] {
                        let partial = program.process_message(message, weight, destination);
                        match &mut total {
                            Some(total) => program.reduce(total, partial),
                            None => total = Some(partial),
                        }
                    }
                }
                *slot = total;
            }
        });
    drop(outbox);

    // Apply
    graph
        .values
        .par_chunks_mut(block)
        .zip(graph.states.par_chunks_mut(block))
        .zip(inbox.par_chunks_mut(block))
        .for_each(|((values, states), totals)| {
            for ((value, state), total) in values.iter_mut().zip(states.iter_mut()).zip(totals) {
                *state = match total.take() {
                    Some(total) => VertexState::after_apply(program.apply(total, value)),
                    None => VertexState::Halted,
                };
            }
        });

    senders
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "vertex program panicked".to_string()
    }
}
