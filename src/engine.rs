// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The engine controls the threads that calculate our fractals.
//!
//! It creates a worker per processor on the machine, once, and keeps
//! them for its whole life.  Each worker takes responsibility for
//! drawing a stripe of the fractal.  The stripes run along the y
//! axis: each worker draws every row of its own range of columns.
//! For a quad-core processor, the image is drawn by 4 workers and
//! striped like so:
//!
//! ```text
//!   -------------------------
//!   |     |     |     |     |
//!   |     |     |     |     |
//!   |  0  |  1  |  2  |  3  |
//!   |     |     |     |     |
//!   |     |     |     |     |
//!   -------------------------
//! ```
//!
//! Configuration can only change while no render is in flight.  A
//! setter called during a render is ignored and returns `false`, and
//! so is a second `start()`.  When the last worker of a cycle reports
//! in, every registered listener is handed the finished framebuffer.

use image::Rgb;
use num_cpus;
use std::collections::BTreeSet;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use complex::ComplexNumber;
use error::Error;
use framebuffer::Framebuffer;
use kernel::Fractal;
use shading;
use viewport::{Stripe, Viewport};
use worker::{Frame, Job, Worker};

/// Something that wants the finished image.
pub type FinishedListener = Arc<dyn Fn(Arc<Framebuffer>) + Send + Sync>;

/// What to draw, apart from where (see [`Viewport`]).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Width of the image in pixels.
    pub width: usize,
    /// Height of the image in pixels.
    pub height: usize,
    /// The iteration cap.  Points that have not escaped after this many
    /// iterations are treated as inside the set.
    pub iterations: u32,
    /// Draw the Julia set of `seed` rather than the family's own set.
    pub julia: bool,
    /// The constant shared by every pixel in Julia mode.
    pub seed: Option<ComplexNumber>,
}

impl Default for RenderConfig {
    fn default() -> RenderConfig {
        RenderConfig {
            width: 0,
            height: 0,
            iterations: 100,
            julia: false,
            seed: None,
        }
    }
}

struct Cycle {
    number: u64,
    in_flight: BTreeSet<usize>,
    stripes: Vec<Stripe>,
    framebuffer: Option<Framebuffer>,
    started: Option<Instant>,
    listeners: Vec<FinishedListener>,
}

/// Tracks which workers are still drawing the current cycle, and
/// assembles their stripes.  The only lock in the engine.
pub(crate) struct Completion {
    cycle: Mutex<Cycle>,
}

impl Completion {
    fn new() -> Completion {
        Completion {
            cycle: Mutex::new(Cycle {
                number: 0,
                in_flight: BTreeSet::new(),
                stripes: Vec::new(),
                framebuffer: None,
                started: None,
                listeners: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<Cycle> {
        self.cycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn running(&self) -> bool {
        !self.lock().in_flight.is_empty()
    }

    fn add_listener(&self, listener: FinishedListener) {
        self.lock().listeners.push(listener);
    }

    fn begin(&self, number: u64, framebuffer: Framebuffer, stripes: Vec<Stripe>) {
        let mut cycle = self.lock();
        cycle.number = number;
        cycle.in_flight = (0..stripes.len()).collect();
        cycle.stripes = stripes;
        cycle.framebuffer = Some(framebuffer);
        cycle.started = Some(Instant::now());
    }

    /// Called by worker `id` when it has finished its stripe of cycle
    /// `number`.  The report that empties the in-flight set hands the
    /// framebuffer to the listeners.  Reports for another cycle, or
    /// that arrive when nothing is in flight, are dropped.
    pub(crate) fn report(&self, id: usize, number: u64, pixels: Option<Vec<Rgb<u8>>>) {
        let (framebuffer, listeners) = {
            let mut cycle = self.lock();
            if cycle.in_flight.is_empty() {
                trace!("Ignoring report from worker {}: nothing in flight", id);
                return;
            }
            if cycle.number != number {
                warn!(
                    "Ignoring report from worker {} for cycle {} during cycle {}",
                    id, number, cycle.number
                );
                return;
            }
            if !cycle.in_flight.remove(&id) {
                warn!("Worker {} reported twice for cycle {}", id, number);
                return;
            }
            if let Some(pixels) = pixels {
                let stripe = cycle.stripes[id];
                if let Some(ref mut framebuffer) = cycle.framebuffer {
                    framebuffer.fill_stripe(&stripe, &pixels);
                }
            }
            trace!(
                "Worker {} done, {} still drawing cycle {}",
                id,
                cycle.in_flight.len(),
                number
            );
            if !cycle.in_flight.is_empty() {
                return;
            }
            if let Some(started) = cycle.started.take() {
                info!("Cycle {} finished in {:?}", number, started.elapsed());
            }
            match cycle.framebuffer.take() {
                Some(framebuffer) => (Arc::new(framebuffer), cycle.listeners.clone()),
                None => return,
            }
        };
        // Listeners run without the lock held, so they are free to ask
        // whether the engine is running.  A panicking listener must not
        // take the worker thread down with it.
        for listener in listeners {
            let framebuffer = framebuffer.clone();
            if panic::catch_unwind(AssertUnwindSafe(|| listener(framebuffer))).is_err() {
                error!("A finished listener panicked in cycle {}", number);
            }
        }
    }
}

/// The partitioned renderer for one fractal family, in either its own
/// form or its Julia form.
pub struct Engine {
    fractal: Fractal,
    config: RenderConfig,
    viewport: Viewport,
    shade_ratio: f64,
    stripes: Vec<Stripe>,
    steps: (f64, f64),
    // False when the size or the viewport changed since the stripes
    // were last worked out.
    ready: bool,
    cycle: u64,
    completion: Arc<Completion>,
    workers: Vec<Worker>,
}

impl Engine {
    /// An engine with one worker per processor.
    pub fn new(fractal: Fractal, julia: bool) -> Result<Engine, Error> {
        Engine::with_workers(fractal, julia, num_cpus::get())
    }

    /// An engine with `workers` workers.  Zero is taken to mean one.
    pub fn with_workers(fractal: Fractal, julia: bool, workers: usize) -> Result<Engine, Error> {
        let completion = Arc::new(Completion::new());
        let workers = (0..workers.max(1))
            .map(|id| Worker::spawn(id, completion.clone()))
            .collect::<Result<Vec<Worker>, Error>>()?;
        debug!("Started {} workers for {}", workers.len(), fractal);
        let config = RenderConfig {
            julia,
            ..RenderConfig::default()
        };
        Ok(Engine {
            fractal,
            config,
            viewport: Viewport::default(),
            shade_ratio: shading::shade_ratio(config.iterations),
            stripes: Vec::new(),
            steps: (0.0, 0.0),
            ready: false,
            cycle: 0,
            completion,
            workers,
        })
    }

    /// True while at least one worker is still drawing.
    pub fn running(&self) -> bool {
        self.completion.running()
    }

    fn rejected(&self, what: &str) -> bool {
        if self.running() {
            debug!("Ignoring {} during a render", what);
            true
        } else {
            false
        }
    }

    /// Changes the size of the image.  The image is split into one
    /// stripe of `width / workers` columns per worker; the columns left
    /// over on the right are not drawn and stay black.
    pub fn resize(&mut self, width: usize, height: usize) -> bool {
        if self.rejected("resize") {
            return false;
        }
        self.ready = false;
        self.config.width = width;
        self.config.height = height;
        true
    }

    /// Changes the part of the complex plane to draw.
    pub fn change_viewport(&mut self, x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> bool {
        if self.rejected("viewport change") {
            return false;
        }
        self.ready = false;
        self.viewport = Viewport::new(x_min, x_max, y_min, y_max);
        true
    }

    /// Sets the iteration cap.  A cap of zero is refused.
    pub fn set_iterations(&mut self, iterations: u32) -> bool {
        if iterations == 0 {
            debug!("Ignoring an iteration cap of zero");
            return false;
        }
        if self.rejected("iteration change") {
            return false;
        }
        self.config.iterations = iterations;
        self.shade_ratio = shading::shade_ratio(iterations);
        true
    }

    /// Sets the Julia seed.  Changing it half way through a render
    /// would mix two different sets in one image.
    pub fn set_seed(&mut self, seed: ComplexNumber) -> bool {
        if self.rejected("seed change") {
            return false;
        }
        self.config.seed = Some(seed);
        true
    }

    /// Registers a listener to be called with every finished image.
    /// Listeners run on the worker thread that finishes last.  A
    /// listener that panics is logged and skipped; the worker and the
    /// remaining listeners carry on.
    pub fn add_finished_listener<F>(&mut self, listener: F)
    where
        F: Fn(Arc<Framebuffer>) + Send + Sync + 'static,
    {
        self.completion.add_listener(Arc::new(listener));
    }

    // Works out every worker's bounds.  False if there is not enough
    // information yet (no size, or an image too narrow to give every
    // worker at least one column) or if the image is too large to hold.
    fn update(&mut self) -> bool {
        let (width, height) = (self.config.width, self.config.height);
        if width / self.workers.len() == 0 || height == 0 {
            debug!(
                "Not starting: {}x{} cannot be split between {} workers",
                width,
                height,
                self.workers.len()
            );
            return false;
        }
        let max_side = u32::max_value() as usize;
        let bytes = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(mem::size_of::<Rgb<u8>>()));
        let addressable = bytes.map_or(false, |b| b <= isize::max_value() as usize);
        if width > max_side || height > max_side || !addressable {
            debug!("Not starting: {}x{} is too large for a framebuffer", width, height);
            return false;
        }
        self.steps = self.viewport.steps(width, height);
        self.stripes = self.viewport.stripes(width, self.workers.len());
        self.ready = true;
        true
    }

    /// Sets the workers drawing.  Does nothing if they already are, or
    /// if the engine does not yet know enough to draw (no size, or Julia
    /// mode without a seed); call it again once it does.  Returns true
    /// if a render was started.
    pub fn start(&mut self) -> bool {
        if self.running() {
            debug!("Already running, ignoring start");
            return false;
        }
        if !self.ready && !self.update() {
            return false;
        }
        let julia_seed = if self.config.julia {
            match self.config.seed {
                Some(seed) => Some(seed),
                None => {
                    debug!("Not starting: Julia mode needs a seed");
                    return false;
                }
            }
        } else {
            None
        };

        self.cycle += 1;
        let (x_step, y_step) = self.steps;
        let frame = Arc::new(Frame {
            fractal: self.fractal,
            julia_seed,
            iterations: self.config.iterations,
            shade_ratio: self.shade_ratio,
            height: self.config.height,
            x_step,
            y_step,
            y_max: self.viewport.y_max,
        });
        info!(
            "Cycle {}: {}x{} {} ({} iterations) on {} workers",
            self.cycle,
            self.config.width,
            self.config.height,
            self.fractal,
            self.config.iterations,
            self.workers.len()
        );
        self.completion.begin(
            self.cycle,
            Framebuffer::new(self.config.width, self.config.height),
            self.stripes.clone(),
        );
        for (worker, stripe) in self.workers.iter().zip(self.stripes.iter()) {
            let job = Job {
                cycle: self.cycle,
                stripe: *stripe,
                frame: frame.clone(),
            };
            if let Err(job) = worker.dispatch(job) {
                error!("Worker {} is gone, its stripe stays black", worker.id());
                self.completion.report(worker.id(), job.cycle, None);
            }
        }
        true
    }

    /// The fractal family this engine draws.
    pub fn fractal(&self) -> Fractal {
        self.fractal
    }

    /// The current configuration.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// The current viewport.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// The number of workers, fixed when the engine was built.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// The stripes of the most recently started render.
    pub fn stripes(&self) -> &[Stripe] {
        &self.stripes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    const PATIENCE: Duration = Duration::from_secs(60);

    fn engine(workers: usize) -> Engine {
        Engine::with_workers(Fractal::Mandelbrot, false, workers).unwrap()
    }

    #[test]
    fn zero_workers_means_one() {
        assert_eq!(engine(0).worker_count(), 1);
    }

    #[test]
    fn defers_without_a_size() {
        let mut e = engine(2);
        assert!(!e.start());
        assert!(!e.running());
        e.resize(0, 10);
        assert!(!e.start());
        e.resize(1, 10);
        assert!(!e.start());
    }

    #[test]
    fn defers_in_julia_mode_without_a_seed() {
        let mut e = Engine::with_workers(Fractal::BurningShip, true, 2).unwrap();
        e.resize(8, 8);
        assert!(!e.start());
        e.set_seed(ComplexNumber::new(-0.5, 0.5));
        let (tx, rx) = channel::unbounded();
        e.add_finished_listener(move |fb| tx.send(fb).unwrap());
        assert!(e.start());
        let fb = rx.recv_timeout(PATIENCE).unwrap();
        assert_eq!((fb.width(), fb.height()), (8, 8));
    }

    #[test]
    fn defers_when_the_image_cannot_be_held() {
        let mut e = engine(1);
        assert!(e.resize(usize::max_value() / 2, 3));
        assert!(!e.start());
        assert!(!e.running());
        e.resize(u32::max_value() as usize, u32::max_value() as usize);
        assert!(!e.start());
        e.resize(4, 4);
        assert!(e.start());
    }

    #[test]
    fn a_panicking_listener_does_not_kill_the_worker() {
        let mut e = engine(1);
        e.resize(8, 8);
        e.change_viewport(1.0, 2.0, 1.0, 2.0);
        let panicked = Arc::new(AtomicBool::new(false));
        {
            let panicked = panicked.clone();
            e.add_finished_listener(move |_| {
                if !panicked.swap(true, Ordering::SeqCst) {
                    panic!("listener failure");
                }
            });
        }
        let (tx, rx) = channel::unbounded();
        e.add_finished_listener(move |fb| tx.send(fb).unwrap());

        assert!(e.start());
        let first = rx.recv_timeout(PATIENCE).unwrap();
        assert!(panicked.load(Ordering::SeqCst));
        assert!(!e.running());
        assert!(e.start());
        let second = rx.recv_timeout(PATIENCE).unwrap();
        assert_eq!(first.get(0, 0), Some(Rgb([255, 255, 247])));
        assert_eq!(*first, *second);
    }

    #[test]
    fn refuses_zero_iterations() {
        let mut e = engine(1);
        assert!(!e.set_iterations(0));
        assert_eq!(e.config().iterations, 100);
        assert!(e.set_iterations(7));
        assert_eq!(e.config().iterations, 7);
    }

    #[test]
    fn stripes_follow_the_size() {
        let mut e = engine(3);
        e.resize(10, 5);
        assert!(e.start());
        let columns: Vec<_> = e.stripes().iter().map(|s| s.columns()).collect();
        assert_eq!(columns, vec![0..3, 3..6, 6..9]);
    }

    #[test]
    fn a_render_notifies_every_listener() {
        let mut e = engine(2);
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = channel::unbounded();
        {
            let calls = calls.clone();
            e.add_finished_listener(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            });
        }
        e.add_finished_listener(move |fb| tx.send(fb).unwrap());
        e.resize(20, 10);
        assert!(e.start());
        rx.recv_timeout(PATIENCE).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!e.running());
    }

    #[test]
    fn stale_and_idle_reports_are_ignored() {
        let completion = Completion::new();
        let calls = Arc::new(AtomicUsize::new(0));
        {
            let calls = calls.clone();
            completion.add_listener(Arc::new(move |_: Arc<Framebuffer>| {
                calls.fetch_add(1, Ordering::SeqCst);
            }));
        }
        let stripes = Viewport::default().stripes(4, 2);

        // Nothing in flight.
        completion.report(0, 0, None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        completion.begin(1, Framebuffer::new(4, 1), stripes);
        assert!(completion.running());
        completion.report(0, 7, None);
        completion.report(0, 1, None);
        completion.report(0, 1, None);
        assert!(completion.running());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        completion.report(1, 1, None);
        assert!(!completion.running());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // A late report once everything is done.
        completion.report(1, 1, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
