use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{PaymentRequest, PaymentStatus};

/// Decision policy assigning a status to a payment request
///
/// Implementations are placeholders for a real risk or fraud engine. The
/// processor only depends on this trait, so a deterministic policy can be
/// injected for tests.
pub trait StatusDecider: Send + Sync {
    fn decide(&self, request: &PaymentRequest) -> PaymentStatus;
}

fn draw<R: Rng + ?Sized>(rng: &mut R) -> PaymentStatus {
    PaymentStatus::ALL[rng.gen_range(0..PaymentStatus::ALL.len())]
}

/// Uniform random draw among all statuses
///
/// Uses the calling thread's RNG so no random state is shared between
/// invocations.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomStatusDecider;

impl StatusDecider for RandomStatusDecider {
    fn decide(&self, _request: &PaymentRequest) -> PaymentStatus {
        draw(&mut rand::thread_rng())
    }
}

/// Uniform draw from a seeded generator, reproducible across runs
pub struct SeededStatusDecider {
    rng: Mutex<StdRng>,
}

impl SeededStatusDecider {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl StatusDecider for SeededStatusDecider {
    fn decide(&self, _request: &PaymentRequest) -> PaymentStatus {
        // A poisoned lock still holds a usable generator
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        draw(&mut *rng)
    }
}

/// Always returns the same status
#[derive(Debug, Clone, Copy)]
pub struct FixedStatusDecider(pub PaymentStatus);

impl StatusDecider for FixedStatusDecider {
    fn decide(&self, _request: &PaymentRequest) -> PaymentStatus {
        self.0
    }
}
