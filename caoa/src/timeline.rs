use std::{cmp::Ordering, cmp::Reverse, collections::BinaryHeap};

use crate::model::Time;

#[derive(Debug, Clone, Copy, PartialEq)]
struct ServerSlot {
    free_at: Time,
    server: usize,
}

impl Eq for ServerSlot {}

impl Ord for ServerSlot {
    fn cmp(&self, other: &Self) -> Ordering {
        self.free_at
            .total_cmp(&other.free_at)
            .then(self.server.cmp(&other.server))
    }
}

impl PartialOrd for ServerSlot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Outcome of booking the earliest free server of a resource.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Claim {
    pub server: usize,
    pub server_free: Time,
    pub start: Time,
    pub finish: Time,
}

/// Free-at times of every server of every resource during one simulation pass.
///
/// Servers start out free since the beginning of time (`f64::MIN`), and the
/// earliest free one is always handed out first. Ties go to the lower server
/// index.
#[derive(Debug, Clone)]
pub struct ResourceTimeline {
    resources: Vec<BinaryHeap<Reverse<ServerSlot>>>,
}

impl ResourceTimeline {
    pub fn new(capacities: &[usize]) -> Self {
        let resources = capacities
            .iter()
            .map(|&capacity| {
                (0..capacity)
                    .map(|server| {
                        Reverse(ServerSlot {
                            free_at: Time::MIN,
                            server,
                        })
                    })
                    .collect()
            })
            .collect();

        Self { resources }
    }

    /// Books the earliest free server of `resource` for `duration`, starting no
    /// earlier than `ready`. A resource without servers behaves like a single
    /// server one.
    pub fn claim(&mut self, resource: usize, ready: Time, duration: Time) -> Claim {
        let servers = &mut self.resources[resource];
        let Reverse(slot) = servers.pop().unwrap_or(Reverse(ServerSlot {
            free_at: Time::MIN,
            server: 0,
        }));

        let start = ready.max(slot.free_at);
        let finish = start + duration;

        servers.push(Reverse(ServerSlot {
            free_at: finish,
            server: slot.server,
        }));

        Claim {
            server: slot.server,
            server_free: slot.free_at,
            start,
            finish,
        }
    }
}
