//! Lazy, ordered stream of enriched hops
//!
//! A [`HopStream`] owns one run of the discovery program. Records are
//! produced one pull at a time: the next line is read only when the consumer
//! asks for the next hop, and each hop's registry lookup finishes before the
//! record is returned, so records always arrive in discovery order.

use super::config::TraceConfig;
use super::error::TraceError;
use super::types::{HopRecord, StreamState};
use crate::parser;
use crate::registry::RegistryResolver;
use futures::Stream;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, trace, warn};

/// One running discovery process and its output
///
/// The child is spawned with `kill_on_drop`, so dropping the session always
/// terminates the process.
#[derive(Debug)]
pub struct TraceSession {
    program: String,
    child: Child,
    output: BufReader<ChildStdout>,
    buf: Vec<u8>,
}

impl TraceSession {
    /// Start the discovery program for `target`
    pub fn launch(config: &TraceConfig, target: &str) -> Result<Self, TraceError> {
        let args = config.command_args(target);
        debug!(program = %config.program, ?args, "starting discovery process");

        let mut child = Command::new(&config.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TraceError::ProcessLaunch {
                program: config.program.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| TraceError::MissingOutput {
            program: config.program.clone(),
        })?;

        Ok(Self {
            program: config.program.clone(),
            child,
            output: BufReader::new(stdout),
            buf: Vec::with_capacity(256),
        })
    }

    /// Read the next output line, or `None` at end of output
    ///
    /// Bytes are decoded lossily so any console code page is accepted.
    /// Cancel-safe: bytes of a partially read line stay buffered until the
    /// next call completes it.
    pub async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        self.output.read_until(b'\n', &mut self.buf).await?;
        if self.buf.is_empty() {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        Ok(Some(line))
    }

    /// OS process id, while the process is running
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for the process to exit after its output ended
    pub async fn finish(mut self) {
        match self.child.wait().await {
            Ok(status) if status.success() => {
                debug!(program = %self.program, "discovery process exited");
            }
            Ok(status) => {
                warn!(program = %self.program, %status, "discovery process exited with failure");
            }
            Err(e) => {
                warn!(program = %self.program, error = %e, "failed to wait for discovery process");
            }
        }
    }

    /// Kill the process and reap it
    pub async fn terminate(mut self) {
        if let Err(e) = self.child.kill().await {
            debug!(program = %self.program, error = %e, "failed to kill discovery process");
        }
    }
}

enum Phase {
    NotStarted,
    Running(TraceSession),
    Draining(TraceSession),
    Terminated,
}

/// Lazy sequence of [`HopRecord`]s for one trace
///
/// Nothing happens until the first [`next_hop`](Self::next_hop) call, which
/// starts the discovery program. Dropping the stream before it ends kills
/// the program; [`close`](Self::close) additionally waits for it to exit.
///
/// # Examples
///
/// ```no_run
/// use astrace::registry::{RegistryConfig, RegistryResolver};
/// use astrace::traceroute::{trace, TraceConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let resolver = RegistryResolver::new(RegistryConfig::default())?;
/// let mut hops = trace("8.8.8.8", TraceConfig::default(), resolver);
///
/// while let Some(hop) = hops.next_hop().await? {
///     println!("{} {} AS{}", hop.sequence_number, hop.address, hop.as_number);
/// }
/// # Ok(())
/// # }
/// ```
pub struct HopStream {
    target: String,
    config: TraceConfig,
    resolver: RegistryResolver,
    phase: Phase,
    sequence: u32,
    pending: Option<PendingHop>,
}

/// A hop read from the output whose lookup has not finished yet
#[derive(Debug, Clone, Copy)]
struct PendingHop {
    address: std::net::Ipv4Addr,
    hop_index: Option<u8>,
}

/// Start tracing `target`; the discovery program runs on the first pull
pub fn trace(
    target: impl Into<String>,
    config: TraceConfig,
    resolver: RegistryResolver,
) -> HopStream {
    HopStream::new(target, config, resolver)
}

impl HopStream {
    /// Create a stream that has not started yet
    pub fn new(target: impl Into<String>, config: TraceConfig, resolver: RegistryResolver) -> Self {
        Self {
            target: target.into(),
            config,
            resolver,
            phase: Phase::NotStarted,
            sequence: 0,
            pending: None,
        }
    }

    /// The traced target
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Current lifecycle state
    pub fn state(&self) -> StreamState {
        match self.phase {
            Phase::NotStarted => StreamState::NotStarted,
            Phase::Running(_) => StreamState::Running,
            Phase::Draining(_) => StreamState::Draining,
            Phase::Terminated => StreamState::Terminated,
        }
    }

    /// Number of records produced so far
    pub fn hops_emitted(&self) -> u32 {
        self.sequence
    }

    /// OS process id of the discovery program, while it runs
    pub fn process_id(&self) -> Option<u32> {
        match &self.phase {
            Phase::Running(session) | Phase::Draining(session) => session.id(),
            _ => None,
        }
    }

    /// Produce the next hop, or `None` once the discovery output has ended
    ///
    /// Only a failure to start the discovery program is returned as an
    /// error; after it the stream is terminated. A read failure on the
    /// program's output kills it and ends the stream.
    ///
    /// # Cancel safety
    ///
    /// Cancel-safe: if the returned future is dropped before completing, no
    /// hop is lost or skipped and the next call resumes where it stopped.
    pub async fn next_hop(&mut self) -> Result<Option<HopRecord>, TraceError> {
        loop {
            match &mut self.phase {
                Phase::NotStarted => match TraceSession::launch(&self.config, &self.target) {
                    Ok(session) => self.phase = Phase::Running(session),
                    Err(e) => {
                        self.phase = Phase::Terminated;
                        return Err(e);
                    }
                },
                Phase::Running(session) => {
                    if let Some(pending) = self.pending {
                        // Numbered only once the lookup completes
                        let owner = self.resolver.resolve(pending.address).await;
                        self.pending = None;
                        self.sequence += 1;
                        let hop = HopRecord::new(self.sequence, pending.address, owner)
                            .with_hop_index(pending.hop_index);
                        debug!(
                            seq = hop.sequence_number,
                            address = %hop.address,
                            asn = %hop.as_number,
                            "hop resolved"
                        );
                        return Ok(Some(hop));
                    }

                    let line = match session.read_line().await {
                        Ok(Some(line)) => line,
                        Ok(None) => {
                            if let Phase::Running(session) =
                                std::mem::replace(&mut self.phase, Phase::Terminated)
                            {
                                self.phase = Phase::Draining(session);
                            }
                            continue;
                        }
                        Err(e) => {
                            warn!(host = %self.target, error = %e, "failed to read discovery output");
                            if let Phase::Running(session) =
                                std::mem::replace(&mut self.phase, Phase::Terminated)
                            {
                                session.terminate().await;
                            }
                            continue;
                        }
                    };
                    match parser::extract_ipv4_with(self.config.line_format, &line) {
                        Some(address) => {
                            self.pending = Some(PendingHop {
                                address,
                                hop_index: parser::hop_index(&line),
                            });
                        }
                        None => trace!(line = line.trim_end(), "no hop address in line"),
                    }
                }
                Phase::Draining(_) => {
                    if let Phase::Draining(session) =
                        std::mem::replace(&mut self.phase, Phase::Terminated)
                    {
                        session.finish().await;
                    }
                    debug!(host = %self.target, hops = self.sequence, "trace finished");
                }
                Phase::Terminated => return Ok(None),
            }
        }
    }

    /// Stop the trace early, killing and reaping the discovery program
    pub async fn close(&mut self) {
        self.pending = None;
        match std::mem::replace(&mut self.phase, Phase::Terminated) {
            Phase::Running(session) | Phase::Draining(session) => session.terminate().await,
            Phase::NotStarted | Phase::Terminated => {}
        }
    }

    /// Adapt into a [`Stream`] of records
    ///
    /// The stream ends after the last hop or right after a launch error.
    pub fn into_stream(self) -> impl Stream<Item = Result<HopRecord, TraceError>> {
        futures::stream::unfold(Some(self), |state| async move {
            let mut hops = state?;
            match hops.next_hop().await {
                Ok(Some(hop)) => Some((Ok(hop), Some(hops))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}

impl std::fmt::Debug for HopStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HopStream")
            .field("target", &self.target)
            .field("state", &self.state())
            .field("sequence", &self.sequence)
            .field("pending", &self.pending)
            .finish()
    }
}
