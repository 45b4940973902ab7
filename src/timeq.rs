/*
Timed servers for the stand-in memory engine.

Each bank of the stand-in engine is wrapped by a TimedServer, which enforces a simple service law:
    - a per-request access latency, overlapped with other requests in flight at the bank
    - a data-bus occupancy expressed in bytes-per-cycle, which serializes bursts

When the server cannot take more work it returns a Backpressure carrying the request back, so the
engine can turn it into a plain reject for the adapter.  Accepted requests yield a `Ticket`
describing when the data will be available.  Service is strictly in order per server.
*/

use std::collections::VecDeque;

use serde::Deserialize;

pub type Cycle = u64;

// Result of queueing a request with a timed server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    ready_at: Cycle,
}

impl Ticket {
    // Cycle at which the server hands the payload back.
    pub fn ready_at(&self) -> Cycle {
        self.ready_at
    }

    pub fn is_ready(&self, now: Cycle) -> bool {
        now >= self.ready_at
    }
}

#[derive(Debug)]
pub struct ServiceRequest<T> {
    pub payload: T,
    pub size_bytes: u32,
    // Overrides the server's base latency for this request only.
    pub latency: Option<Cycle>,
}

impl<T> ServiceRequest<T> {
    pub fn new(payload: T, size_bytes: u32) -> Self {
        Self {
            payload,
            size_bytes,
            latency: None,
        }
    }

    pub fn with_latency(mut self, latency: Cycle) -> Self {
        self.latency = Some(latency);
        self
    }
}

#[derive(Debug)]
pub struct ServiceResult<T> {
    pub payload: T,
    pub ticket: Ticket,
}

// Reasons why the server rejected a request
#[derive(Debug)]
pub enum Backpressure<T> {
    // Too many requests already in flight at this server
    QueueFull {
        request: ServiceRequest<T>,
        capacity: usize,
    },
    // The data bus is still occupied by an earlier burst
    Busy {
        request: ServiceRequest<T>,
        available_at: Cycle,
    },
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    // Latency added to every request unless the request overrides it
    pub base_latency: Cycle,
    // Data-bus throughput
    pub bytes_per_cycle: u32,
    // Maximum number of requests in flight at the server
    pub queue_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_latency: 0,
            bytes_per_cycle: 1,
            queue_capacity: 1,
        }
    }
}

#[derive(Debug)]
struct Inflight<T> {
    payload: T,
    ticket: Ticket,
}

#[derive(Debug)]
pub struct TimedServer<T> {
    config: ServerConfig,
    inflight: VecDeque<Inflight<T>>,
    // first cycle at which the data bus is free again
    bus_free_at: Cycle,
    // completion of the youngest request; keeps service in order
    last_ready_at: Cycle,
}

impl<T> TimedServer<T> {
    pub fn new(config: ServerConfig) -> Self {
        assert!(config.bytes_per_cycle > 0, "bytes_per_cycle must be > 0");
        assert!(config.queue_capacity > 0, "queue_capacity must be > 0");
        Self {
            config,
            inflight: VecDeque::with_capacity(config.queue_capacity),
            bus_free_at: 0,
            last_ready_at: 0,
        }
    }

    // Attempt to enqueue a request at the provided cycle.
    pub fn try_enqueue(
        &mut self,
        now: Cycle,
        request: ServiceRequest<T>,
    ) -> Result<Ticket, Backpressure<T>> {
        if self.inflight.len() >= self.config.queue_capacity {
            return Err(Backpressure::QueueFull {
                request,
                capacity: self.config.queue_capacity,
            });
        }
        if self.bus_free_at > now {
            return Err(Backpressure::Busy {
                request,
                available_at: self.bus_free_at,
            });
        }

        let burst = ceil_div_u64(request.size_bytes as u64, self.config.bytes_per_cycle as u64);
        let latency = request.latency.unwrap_or(self.config.base_latency);
        let ready_at = now
            .saturating_add(latency)
            .saturating_add(burst)
            .max(self.last_ready_at);
        let ticket = Ticket { ready_at };

        self.bus_free_at = now.saturating_add(burst);
        self.last_ready_at = ready_at;
        self.inflight.push_back(Inflight {
            payload: request.payload,
            ticket,
        });

        Ok(ticket)
    }

    // Drain any requests that have completed by "now", oldest first.
    pub fn service_ready<F>(&mut self, now: Cycle, mut callback: F)
    where
        F: FnMut(ServiceResult<T>),
    {
        while let Some(front) = self.inflight.front() {
            if !front.ticket.is_ready(now) {
                break;
            }
            if let Some(done) = self.inflight.pop_front() {
                callback(ServiceResult {
                    payload: done.payload,
                    ticket: done.ticket,
                });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inflight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inflight.is_empty()
    }
}

fn ceil_div_u64(nom: u64, denom: u64) -> Cycle {
    debug_assert!(denom > 0);
    nom.div_ceil(denom)
}
