//! The page's single audio/visual service: analyzer bridge + renderer +
//! running flag, driven once per animation frame by the host.

use crate::analyzer::{AnalyzerBridge, AudioGraph};
use crate::config::VisualizerConfig;
use crate::error::AudioError;
use crate::renderer::{AmbientFrame, AmbientTargets, Renderer, Surface};

pub struct AudioVisualizerService<G: AudioGraph> {
    bridge: AnalyzerBridge<G>,
    renderer: Renderer,
    running: bool,
}

impl<G: AudioGraph> AudioVisualizerService<G> {
    pub fn new(graph: G, cfg: VisualizerConfig) -> Self {
        Self {
            bridge: AnalyzerBridge::new(graph, cfg.window_size()),
            renderer: Renderer::new(cfg),
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    pub fn bridge(&self) -> &AnalyzerBridge<G> {
        &self.bridge
    }

    /// Attach `element` to the analyzer. The first success starts the render
    /// loop; it then keeps running even if a later connect fails.
    pub fn connect(&mut self, element: &G::Element) -> Result<(), AudioError> {
        self.bridge.connect(element)?;
        if !self.running {
            tracing::info!("visualizer running");
            self.running = true;
        }
        Ok(())
    }

    pub fn snapshot(&mut self) -> Option<&[u8]> {
        self.bridge.snapshot()
    }

    /// One animation frame. A no-op until running, while no source is
    /// attached, and when there is no canvas to draw on.
    pub fn frame<S, T>(&mut self, now_ms: f64, surface: Option<&mut S>, targets: &mut T) -> Option<AmbientFrame>
    where
        S: Surface + ?Sized,
        T: AmbientTargets + ?Sized,
    {
        if !self.running {
            return None;
        }
        let snapshot = self.bridge.snapshot();
        self.renderer.step(now_ms, snapshot, surface, targets)
    }
}
