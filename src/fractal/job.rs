//! Background render jobs
//!
//! A render request is one plain-data message carrying every parameter; the
//! job replies with a stream of tiles and a final done marker. Nothing
//! executable crosses this boundary - the same evaluator code is compiled
//! into both sides.
//!
//! Superseding a render never queues: spawning a new job for new parameters
//! and dropping the old handle discards the stale render outright, so tiles
//! from two parameter sets can never mix in one frame.

use serde::{Deserialize, Serialize};

use super::evaluate::FractalView;
use super::params::{ComplexParameter, FractalFormula, RenderParams};
use super::tiles::{Tile, TileRenderer};
use crate::consts::DEFAULT_TILE_HEIGHT;

/// Full parameter set for one render, as sent to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub width: u32,
    pub height: u32,
    pub depth: f64,
    pub amplifiers: u32,
    pub center: ComplexParameter,
    pub formula: FractalFormula,
    pub tile_height: u32,
}

impl RenderRequest {
    pub fn new(
        width: u32,
        height: u32,
        depth: f64,
        amplifiers: u32,
        center: ComplexParameter,
        formula: FractalFormula,
    ) -> Self {
        Self {
            width,
            height,
            depth,
            amplifiers,
            center,
            formula,
            tile_height: DEFAULT_TILE_HEIGHT,
        }
    }

    /// Derive the evaluator view on the worker side.
    pub fn to_view(&self) -> FractalView {
        FractalView::new(
            self.width,
            self.height,
            self.center,
            self.formula,
            RenderParams::derive(self.depth, self.amplifiers),
        )
    }
}

/// Worker replies: completed strips, then one completion signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderReply {
    Tile(Tile),
    Done,
}

/// A cancellable in-flight render on a dedicated thread.
///
/// Dropping the handle (or calling [`RenderJob::cancel`]) flags the worker,
/// which bails at the next strip boundary. Replies already in the channel are
/// simply discarded with the receiver.
#[cfg(not(target_arch = "wasm32"))]
pub struct RenderJob {
    cancel: std::sync::Arc<std::sync::atomic::AtomicBool>,
    rx: std::sync::mpsc::Receiver<RenderReply>,
}

#[cfg(not(target_arch = "wasm32"))]
impl RenderJob {
    pub fn spawn(request: RenderRequest) -> Self {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::{Arc, mpsc};

        let cancel = Arc::new(AtomicBool::new(false));
        let flag = cancel.clone();
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            let renderer = TileRenderer::new(request.to_view(), request.tile_height);
            for tile in renderer {
                if flag.load(Ordering::Relaxed) {
                    log::debug!("render job cancelled at y={}", tile.y_offset);
                    return;
                }
                if tx.send(RenderReply::Tile(tile)).is_err() {
                    return;
                }
            }
            let _ = tx.send(RenderReply::Done);
        });

        Self { cancel, rx }
    }

    /// Drain whatever replies have arrived so far.
    pub fn poll(&self) -> Vec<RenderReply> {
        self.rx.try_iter().collect()
    }

    /// Block until the job finishes, collecting every tile.
    pub fn wait(self) -> Vec<Tile> {
        let mut tiles = Vec::new();
        for reply in self.rx.iter() {
            match reply {
                RenderReply::Tile(tile) => tiles.push(tile),
                RenderReply::Done => break,
            }
        }
        tiles
    }

    pub fn cancel(&self) {
        self.cancel.store(true, std::sync::atomic::Ordering::Relaxed);
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Drop for RenderJob {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Worker-side render loop, exported for the worker bootstrap script.
///
/// Runs inside a dedicated worker: deserialize the request, render every
/// strip, post each reply back as JSON. Cancellation is the host terminating
/// the whole worker, so no flag is checked here.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn render_worker(request_json: &str) -> Result<(), wasm_bindgen::JsValue> {
    use wasm_bindgen::{JsCast, JsValue};

    let request: RenderRequest =
        serde_json::from_str(request_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let scope: web_sys::DedicatedWorkerGlobalScope = js_sys::global().unchecked_into();

    let renderer = TileRenderer::new(request.to_view(), request.tile_height);
    for tile in renderer {
        let reply = serde_json::to_string(&RenderReply::Tile(tile))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        scope.post_message(&JsValue::from_str(&reply))?;
    }
    let done = serde_json::to_string(&RenderReply::Done)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    scope.post_message(&JsValue::from_str(&done))?;
    Ok(())
}

/// A cancellable in-flight render on a dedicated web worker.
///
/// The worker bootstraps the same wasm module and runs [`render_worker`];
/// only serialized [`RenderRequest`]/[`RenderReply`] messages cross the
/// boundary. Dropping the handle terminates the worker outright, so
/// superseding a render mid-flight discards the stale strips, same as the
/// native thread cancellation.
#[cfg(target_arch = "wasm32")]
pub struct RenderJob {
    worker: web_sys::Worker,
    inbox: std::rc::Rc<std::cell::RefCell<std::collections::VecDeque<RenderReply>>>,
    _onmessage: wasm_bindgen::closure::Closure<dyn FnMut(web_sys::MessageEvent)>,
}

#[cfg(target_arch = "wasm32")]
impl RenderJob {
    /// Script that bootstraps the wasm module inside the worker.
    const WORKER_SCRIPT: &'static str = "./render_worker.js";

    pub fn spawn(request: RenderRequest) -> Result<Self, wasm_bindgen::JsValue> {
        use std::cell::RefCell;
        use std::collections::VecDeque;
        use std::rc::Rc;
        use wasm_bindgen::closure::Closure;
        use wasm_bindgen::{JsCast, JsValue};

        let options = web_sys::WorkerOptions::new();
        options.set_type(web_sys::WorkerType::Module);
        let worker = web_sys::Worker::new_with_options(Self::WORKER_SCRIPT, &options)?;

        let inbox: Rc<RefCell<VecDeque<RenderReply>>> = Rc::default();
        let queue = inbox.clone();
        let onmessage = Closure::<dyn FnMut(_)>::new(move |event: web_sys::MessageEvent| {
            if let Some(text) = event.data().as_string() {
                match serde_json::from_str(&text) {
                    Ok(reply) => queue.borrow_mut().push_back(reply),
                    Err(e) => log::warn!("malformed worker reply: {e}"),
                }
            }
        });
        worker.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));

        let json =
            serde_json::to_string(&request).map_err(|e| JsValue::from_str(&e.to_string()))?;
        worker.post_message(&JsValue::from_str(&json))?;

        Ok(Self {
            worker,
            inbox,
            _onmessage: onmessage,
        })
    }

    /// Drain whatever replies have arrived so far.
    pub fn poll(&self) -> Vec<RenderReply> {
        self.inbox.borrow_mut().drain(..).collect()
    }

    pub fn cancel(&self) {
        self.worker.terminate();
    }
}

#[cfg(target_arch = "wasm32")]
impl Drop for RenderJob {
    fn drop(&mut self) {
        self.worker.terminate();
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    fn request(width: u32, height: u32) -> RenderRequest {
        RenderRequest::new(
            width,
            height,
            0.0,
            0,
            ComplexParameter::new(-0.5, 0.0),
            FractalFormula::Mandelbrot,
        )
    }

    #[test]
    fn test_job_streams_all_tiles_then_done() {
        let req = request(16, 64);
        let tiles = RenderJob::spawn(req).wait();

        let total_rows: u32 = tiles.iter().map(|t| t.height).sum();
        assert_eq!(total_rows, 64);
    }

    #[test]
    fn test_job_output_matches_synchronous_render() {
        let req = request(20, 20);
        let tiles = RenderJob::spawn(req).wait();

        let mut frame = vec![0u8; (req.width * req.height * 4) as usize];
        for tile in &tiles {
            tile.composite_into(&mut frame, req.width);
        }

        let expected = crate::fractal::tiles::render_frame(&req.to_view(), req.tile_height);
        assert_eq!(frame, expected);
    }

    #[test]
    fn test_cancelled_job_stops_short() {
        // A large frame cancelled immediately should not deliver every strip.
        // Timing-dependent in the other direction is fine: the assertion only
        // requires that cancellation is not an error.
        let req = RenderRequest {
            tile_height: 8,
            ..request(256, 1024)
        };
        let job = RenderJob::spawn(req);
        job.cancel();
        let replies = job.poll();
        assert!(replies.len() <= (1024 / 8) + 1);
    }

    #[test]
    fn test_request_round_trips_through_json() {
        // The worker boundary carries serialized data only
        let req = request(100, 80);
        let json = serde_json::to_string(&req).unwrap();
        let back: RenderRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, req);
        assert_eq!(back.to_view(), req.to_view());
    }

    #[test]
    fn test_replies_round_trip_through_json() {
        // Every reply the worker posts must survive the serialized boundary
        // with pixels intact, Done marker included.
        let req = request(16, 16);
        let mut replies: Vec<RenderReply> = RenderJob::spawn(req)
            .wait()
            .into_iter()
            .map(RenderReply::Tile)
            .collect();
        replies.push(RenderReply::Done);

        for reply in replies {
            let json = serde_json::to_string(&reply).unwrap();
            let back: RenderReply = serde_json::from_str(&json).unwrap();
            assert_eq!(back, reply);
        }
    }
}
