extern crate crossbeam;
extern crate image;
extern crate stripebrot;

use crossbeam::channel::{self, Receiver};
use image::Rgb;
use std::sync::Arc;
use std::time::Duration;

use stripebrot::{ComplexNumber, Engine, Fractal, Framebuffer};

const PATIENCE: Duration = Duration::from_secs(120);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

fn listen(engine: &mut Engine) -> Receiver<Arc<Framebuffer>> {
    let (sender, receiver) = channel::unbounded();
    engine.add_finished_listener(move |framebuffer| {
        let _ = sender.send(framebuffer);
    });
    receiver
}

// A viewport well inside the main cardioid: every pixel runs to the
// cap, which keeps the workers busy long enough to poke at the engine
// while they draw.
fn slow_engine() -> Engine {
    let mut engine = Engine::with_workers(Fractal::Mandelbrot, false, 2).unwrap();
    engine.resize(120, 120);
    engine.change_viewport(-0.2, 0.2, -0.2, 0.2);
    engine.set_iterations(10_000);
    engine
}

#[test]
fn mandelbrot_end_to_end() {
    let mut engine = Engine::with_workers(Fractal::Mandelbrot, false, 4).unwrap();
    let frames = listen(&mut engine);
    engine.change_viewport(-2.0, 2.0, -1.6, 1.6);
    engine.set_iterations(50);
    engine.resize(200, 150);
    assert!(engine.start());

    let fb = frames.recv_timeout(PATIENCE).unwrap();
    assert_eq!((fb.width(), fb.height()), (200, 150));
    let corner = fb.get(0, 0).unwrap();
    let centre = fb.get(100, 75).unwrap();
    assert_eq!(centre, BLACK);
    assert_ne!(corner, centre);
    // -2 + 1.6i escapes on the first iteration.
    assert_eq!(corner, Rgb([255, 255, 240]));
}

#[test]
fn every_column_is_drawn_when_the_width_divides() {
    let mut engine = Engine::with_workers(Fractal::Mandelbrot, false, 4).unwrap();
    let frames = listen(&mut engine);
    engine.change_viewport(1.0, 2.0, 1.0, 2.0);
    engine.resize(40, 10);
    assert!(engine.start());
    let fb = frames.recv_timeout(PATIENCE).unwrap();
    // Nothing in this viewport is in the set.
    for x in 0..40 {
        assert!(fb.column(x).unwrap().iter().all(|p| *p != BLACK), "column {}", x);
    }
}

#[test]
fn leftover_columns_stay_black() {
    let mut engine = Engine::with_workers(Fractal::Mandelbrot, false, 3).unwrap();
    let frames = listen(&mut engine);
    engine.change_viewport(1.0, 2.0, 1.0, 2.0);
    engine.resize(11, 4);
    assert!(engine.start());
    let fb = frames.recv_timeout(PATIENCE).unwrap();
    assert_eq!(fb.width(), 11);
    assert!(fb.column(8).unwrap().iter().all(|p| *p != BLACK));
    assert!(fb.column(9).unwrap().iter().all(|p| *p == BLACK));
    assert!(fb.column(10).unwrap().iter().all(|p| *p == BLACK));
}

#[test]
fn starting_twice_notifies_once() {
    let mut engine = slow_engine();
    let frames = listen(&mut engine);
    assert!(engine.start());
    assert!(!engine.start());
    frames.recv_timeout(PATIENCE).unwrap();
    assert!(frames.recv_timeout(Duration::from_millis(500)).is_err());
}

#[test]
fn configuration_is_frozen_while_rendering() {
    let mut engine = slow_engine();
    let frames = listen(&mut engine);
    assert!(engine.start());
    assert!(engine.running());
    assert!(!engine.resize(10, 10));
    assert!(!engine.change_viewport(-2.0, 2.0, -2.0, 2.0));
    assert!(!engine.set_iterations(10));
    assert!(!engine.set_seed(ComplexNumber::new(0.0, 0.0)));

    let fb = frames.recv_timeout(PATIENCE).unwrap();
    assert_eq!((fb.width(), fb.height()), (120, 120));
    assert!(!engine.running());
    assert_eq!(engine.config().iterations, 10_000);

    assert!(engine.resize(10, 10));
    assert!(engine.set_iterations(10));
    assert!(engine.start());
    let fb = frames.recv_timeout(PATIENCE).unwrap();
    assert_eq!((fb.width(), fb.height()), (10, 10));
}

#[test]
fn workers_are_reused_across_cycles() {
    let mut engine = Engine::with_workers(Fractal::BurningShip, false, 2).unwrap();
    let frames = listen(&mut engine);
    engine.resize(16, 16);
    for _ in 0..5 {
        assert!(engine.start());
        frames.recv_timeout(PATIENCE).unwrap();
    }
    assert_eq!(engine.worker_count(), 2);
}

#[test]
fn each_cycle_gets_a_fresh_framebuffer() {
    let mut engine = Engine::with_workers(Fractal::Mandelbrot, false, 2).unwrap();
    let frames = listen(&mut engine);
    engine.resize(8, 8);
    assert!(engine.start());
    let first = frames.recv_timeout(PATIENCE).unwrap();
    engine.change_viewport(-0.1, 0.1, -0.1, 0.1);
    assert!(engine.start());
    let second = frames.recv_timeout(PATIENCE).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_ne!(*first, *second);
    assert!(second.column(0).unwrap().iter().all(|p| *p == BLACK));
}

#[test]
fn julia_render_uses_the_seed() {
    let mut own = Engine::with_workers(Fractal::Mandelbrot, false, 2).unwrap();
    let mut julia = Engine::with_workers(Fractal::Mandelbrot, true, 2).unwrap();
    let own_frames = listen(&mut own);
    let julia_frames = listen(&mut julia);
    for engine in &mut [&mut own, &mut julia] {
        engine.resize(32, 24);
        engine.set_iterations(50);
    }
    julia.set_seed(ComplexNumber::new(-0.8, 0.156));
    assert!(own.start());
    assert!(julia.start());
    let own_fb = own_frames.recv_timeout(PATIENCE).unwrap();
    let julia_fb = julia_frames.recv_timeout(PATIENCE).unwrap();
    assert_ne!(*own_fb, *julia_fb);
}

#[test]
fn default_engine_has_at_least_one_worker() {
    let engine = Engine::new(Fractal::Mandelbrot, false).unwrap();
    assert!(engine.worker_count() >= 1);
    assert!(!engine.running());
}
