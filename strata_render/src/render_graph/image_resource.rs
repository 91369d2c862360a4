/// Image resource referenced by render graph passes
///
/// The image itself is owned elsewhere (swapchain, texture manager, render
/// target allocator). This wrapper only carries what the graph needs: the
/// handles, the format, the extent and the state the image was left in by the
/// last recorded pass.

use std::sync::{Arc, Mutex};

use crate::device::{
    ImageBarrier, ImageHandle, ImageViewHandle, ResourceState, SampleCount, TextureFormat,
};

#[derive(Debug)]
pub struct ImageResource {
    name: String,
    image: ImageHandle,
    view: Option<ImageViewHandle>,
    format: TextureFormat,
    width: u32,
    height: u32,
    samples: SampleCount,
    state: Mutex<ResourceState>,
}

impl ImageResource {
    /// New single-sampled resource in the `UNDEFINED` state
    pub fn new(
        name: &str,
        image: ImageHandle,
        view: Option<ImageViewHandle>,
        format: TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            name: name.to_string(),
            image,
            view,
            format,
            width,
            height,
            samples: SampleCount::S1,
            state: Mutex::new(ResourceState::UNDEFINED),
        }
    }

    pub fn with_samples(mut self, samples: SampleCount) -> Self {
        self.samples = samples;
        self
    }

    /// Start tracking from `state` instead of `UNDEFINED`
    pub fn with_state(self, state: ResourceState) -> Self {
        self.set_state(state);
        self
    }

    /// Shorthand for `Arc::new(self)`
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> ImageHandle {
        self.image
    }

    pub fn view(&self) -> Option<ImageViewHandle> {
        self.view.filter(|v| !v.is_null())
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn extent(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn samples(&self) -> SampleCount {
        self.samples
    }

    /// State the image was left in
    pub fn state(&self) -> ResourceState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Override the tracked state after a transition made outside the graph
    /// (present, upload, external queue)
    pub fn set_state(&self, state: ResourceState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// Move the tracked state to `required`, returning the barrier it needs
    pub(crate) fn transition_to(&self, required: ResourceState) -> Option<ImageBarrier> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let old_state = *state;
        *state = required;
        old_state.needs_barrier_to(&required).then(|| ImageBarrier {
            image: self.image,
            aspect: self.format.aspect(),
            old_state,
            new_state: required,
        })
    }
}
