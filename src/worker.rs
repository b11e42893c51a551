// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Stripe workers.
//!
//! Each worker is a thread that lives as long as its engine.  It sits
//! on its own job channel between cycles; a job names the stripe to
//! draw and carries a frozen copy of everything needed to draw it, so
//! the worker never looks at the engine's (mutable) configuration.
//! The worker draws into a buffer that it alone owns and hands the
//! buffer to the completion tracker when it is done.

use crossbeam::channel::{self, Receiver, Sender};
use image::Rgb;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use complex::ComplexNumber;
use engine::Completion;
use error::Error;
use kernel::Fractal;
use shading;
use viewport::Stripe;

/// Everything a worker needs to know about a cycle, fixed at the
/// moment the cycle starts.  Shared by all the workers of that cycle.
#[derive(Clone, Debug)]
pub(crate) struct Frame {
    pub(crate) fractal: Fractal,
    /// `Some(seed)` in Julia mode.
    pub(crate) julia_seed: Option<ComplexNumber>,
    pub(crate) iterations: u32,
    pub(crate) shade_ratio: f64,
    pub(crate) height: usize,
    pub(crate) x_step: f64,
    pub(crate) y_step: f64,
    pub(crate) y_max: f64,
}

/// One stripe of one cycle.
pub(crate) struct Job {
    pub(crate) cycle: u64,
    pub(crate) stripe: Stripe,
    pub(crate) frame: Arc<Frame>,
}

/// Draws a stripe.  The result holds the stripe's columns left to
/// right, each column top to bottom.
pub(crate) fn render_stripe(stripe: &Stripe, frame: &Frame) -> Vec<Rgb<u8>> {
    let mut pixels = Vec::with_capacity(stripe.width() * frame.height);
    for (x, y) in iproduct!(stripe.columns(), 0..frame.height) {
        let point = ComplexNumber::new(
            stripe.axis_x(x, frame.x_step),
            frame.y_max - (y as f64) * frame.y_step,
        );
        let count = match frame.julia_seed {
            Some(ref seed) => frame.fractal.calculate(point, seed, frame.iterations),
            None => frame.fractal.calculate_own_point(point, frame.iterations),
        };
        pixels.push(shading::color(count, frame.shade_ratio));
    }
    pixels
}

fn run(id: usize, jobs: Receiver<Job>, completion: Arc<Completion>) {
    for job in jobs.iter() {
        trace!(
            "Worker {} drawing columns {:?} of cycle {}",
            id,
            job.stripe.columns(),
            job.cycle
        );
        let pixels = render_stripe(&job.stripe, &job.frame);
        completion.report(id, job.cycle, Some(pixels));
    }
    debug!("Worker {} shutting down", id);
}

/// The engine's handle on a worker thread.
pub(crate) struct Worker {
    id: usize,
    jobs: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub(crate) fn spawn(id: usize, completion: Arc<Completion>) -> Result<Worker, Error> {
        let (sender, receiver) = channel::unbounded();
        let handle = thread::Builder::new()
            .name(format!("stripe-worker-{}", id))
            .spawn(move || run(id, receiver, completion))
            .map_err(|e| Error::Spawn(id, e))?;
        Ok(Worker {
            id,
            jobs: Some(sender),
            handle: Some(handle),
        })
    }

    pub(crate) fn id(&self) -> usize {
        self.id
    }

    /// Wakes the worker up with a new job.  If the worker thread is
    /// gone the job is handed back.
    pub(crate) fn dispatch(&self, job: Job) -> Result<(), Job> {
        match self.jobs {
            Some(ref jobs) => jobs.send(job).map_err(|e| e.into_inner()),
            None => Err(job),
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Closing the channel ends the worker's loop.
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Worker {} panicked", self.id);
            }
        }
    }
}
