//! Frequency analyzer bridge.
//!
//! `AnalyzerBridge` keeps at most one source attached to the single analysis
//! node of the page and hands out fresh magnitude snapshots on demand. The
//! audio graph itself sits behind `AudioGraph` so the bridge logic runs in
//! native tests; `WebAudioGraph` is the Web Audio implementation.

use crate::error::AudioError;

/// The pieces of an audio graph the bridge needs.
pub trait AudioGraph {
    /// Whatever identifies a playing element (an `<audio>` in the browser).
    type Element;
    /// A source node created from an element.
    type Source;

    /// Create (or reuse) the source node for `element`.
    fn create_source(&mut self, element: &Self::Element) -> Result<Self::Source, AudioError>;
    /// Set the analysis transform size. Always a power of two.
    fn set_window_size(&mut self, fft_size: u32);
    /// Connect `source` into the analysis node.
    fn attach(&mut self, source: &Self::Source) -> Result<(), AudioError>;
    /// Drop every edge leaving `source`. Must tolerate an already detached source.
    fn detach(&mut self, source: &Self::Source);
    /// Number of frequency bins (half the window size).
    fn bin_count(&self) -> usize;
    /// Fill `out` with the current magnitudes.
    fn read_frequencies(&self, out: &mut [u8]);
}

pub struct AnalyzerBridge<G: AudioGraph> {
    graph: G,
    current: Option<G::Source>,
    fft_size: u32,
    buf: Vec<u8>,
}

impl<G: AudioGraph> AnalyzerBridge<G> {
    pub fn new(graph: G, fft_size: u32) -> Self {
        Self { graph, current: None, fft_size, buf: Vec::new() }
    }

    pub fn is_connected(&self) -> bool {
        self.current.is_some()
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Swap the analysed source for `element`. The previous source is
    /// detached first, whether or not the new one attaches.
    pub fn connect(&mut self, element: &G::Element) -> Result<(), AudioError> {
        if let Some(prev) = self.current.take() {
            self.graph.detach(&prev);
        }
        let source = self.graph.create_source(element).inspect_err(|e| {
            tracing::warn!("visualizer stays dark: {e}");
        })?;
        self.graph.set_window_size(self.fft_size);
        if let Err(e) = self.graph.attach(&source) {
            tracing::warn!("visualizer stays dark: {e}");
            self.graph.detach(&source);
            return Err(e);
        }
        self.current = Some(source);
        self.buf.resize(self.graph.bin_count(), 0);
        Ok(())
    }

    /// Current magnitudes, read fresh on every call. `None` while nothing is
    /// attached.
    pub fn snapshot(&mut self) -> Option<&[u8]> {
        self.current.as_ref()?;
        let bins = self.graph.bin_count();
        if self.buf.len() != bins {
            self.buf.resize(bins, 0);
        }
        self.graph.read_frequencies(&mut self.buf);
        Some(&self.buf)
    }
}

/// Web Audio graph: one `AudioContext` with one `AnalyserNode` wired to the
/// destination. Both are created lazily on the first source so the context
/// is born inside a user gesture.
#[derive(Default)]
pub struct WebAudioGraph {
    nodes: Option<(web_sys::AudioContext, web_sys::AnalyserNode)>,
    // Browsers refuse a second MediaElementSource per element, so keep them.
    sources: Vec<(web_sys::HtmlMediaElement, web_sys::MediaElementAudioSourceNode)>,
}

impl WebAudioGraph {
    fn nodes(&mut self) -> Result<&(web_sys::AudioContext, web_sys::AnalyserNode), AudioError> {
        if self.nodes.is_none() {
            let ctx = web_sys::AudioContext::new()
                .map_err(|e| AudioError::ContextUnavailable(format!("{e:?}")))?;
            let analyser = ctx
                .create_analyser()
                .map_err(|e| AudioError::ContextUnavailable(format!("{e:?}")))?;
            analyser
                .connect_with_audio_node(&ctx.destination())
                .map_err(|e| AudioError::GraphAttachFailure(format!("{e:?}")))?;
            self.nodes = Some((ctx, analyser));
        }
        self.nodes
            .as_ref()
            .ok_or_else(|| AudioError::ContextUnavailable("no audio context".into()))
    }

    /// Resume a context suspended by autoplay policy. Fire-and-forget.
    pub fn resume(&self) {
        if let Some((ctx, _)) = &self.nodes {
            let _ = ctx.resume();
        }
    }
}

impl AudioGraph for WebAudioGraph {
    type Element = web_sys::HtmlMediaElement;
    type Source = web_sys::MediaElementAudioSourceNode;

    fn create_source(&mut self, element: &Self::Element) -> Result<Self::Source, AudioError> {
        if let Some((_, src)) = self.sources.iter().find(|(el, _)| el == element) {
            return Ok(src.clone());
        }
        let (ctx, _) = self.nodes()?;
        let src = ctx
            .create_media_element_source(element)
            .map_err(|e| AudioError::GraphAttachFailure(format!("{e:?}")))?;
        self.sources.push((element.clone(), src.clone()));
        Ok(src)
    }

    fn set_window_size(&mut self, fft_size: u32) {
        if let Some((_, analyser)) = &self.nodes {
            analyser.set_fft_size(fft_size);
        }
    }

    fn attach(&mut self, source: &Self::Source) -> Result<(), AudioError> {
        let (_, analyser) = self.nodes()?;
        source
            .connect_with_audio_node(analyser)
            .map(|_| ())
            .map_err(|e| AudioError::GraphAttachFailure(format!("{e:?}")))
    }

    fn detach(&mut self, source: &Self::Source) {
        let _ = source.disconnect();
    }

    fn bin_count(&self) -> usize {
        self.nodes
            .as_ref()
            .map(|(_, a)| a.frequency_bin_count() as usize)
            .unwrap_or(0)
    }

    fn read_frequencies(&self, out: &mut [u8]) {
        if let Some((_, analyser)) = &self.nodes {
            analyser.get_byte_frequency_data(out);
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashSet;

    /// Scripted graph: elements are plain ids, `refuse` lists ids whose source
    /// creation fails, `edges` is the set of sources currently wired in.
    #[derive(Default)]
    pub struct ScriptedGraph {
        pub refuse: HashSet<u32>,
        pub edges: HashSet<u32>,
        pub fft_size: u32,
        pub level: u8,
        pub reads: usize,
    }

    impl AudioGraph for ScriptedGraph {
        type Element = u32;
        type Source = u32;

        fn create_source(&mut self, element: &u32) -> Result<u32, AudioError> {
            if self.refuse.contains(element) {
                Err(AudioError::GraphAttachFailure(format!("element {element}")))
            } else {
                Ok(*element)
            }
        }
        fn set_window_size(&mut self, fft_size: u32) {
            self.fft_size = fft_size;
        }
        fn attach(&mut self, source: &u32) -> Result<(), AudioError> {
            self.edges.insert(*source);
            Ok(())
        }
        fn detach(&mut self, source: &u32) {
            self.edges.remove(source);
        }
        fn bin_count(&self) -> usize {
            (self.fft_size / 2) as usize
        }
        fn read_frequencies(&self, out: &mut [u8]) {
            out.fill(self.level);
        }
    }
}
