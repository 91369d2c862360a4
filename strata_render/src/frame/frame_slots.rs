/// Frame-in-flight slots
///
/// Each of the K slots owns a command list, a completion fence and a dynamic
/// descriptor pool for the sets its frame binds. A slot is only reused after
/// its fence has signalled, which is what makes resetting its pool safe.

use crate::descriptor::DynamicDescriptorPool;
use crate::device::{CommandList, FenceHandle, SemaphoreHandle, SemaphoreWait, SharedDevice};
use crate::error::{Error, Result};
use crate::config::Config;
use crate::utils::lock;
use crate::{engine_bail, engine_debug, engine_error};

struct FrameSlot {
    cmd: Box<dyn CommandList>,
    fence: FenceHandle,
    descriptors: DynamicDescriptorPool,
}

/// The slot being recorded
pub struct Frame<'a> {
    pub cmd: &'a mut dyn CommandList,
    /// Transient sets, valid until this slot comes around again
    pub descriptors: &'a mut DynamicDescriptorPool,
    /// Slot index in `0..frames_in_flight`
    pub index: usize,
    pub frame_number: u64,
}

pub struct FrameSlots {
    device: SharedDevice,
    slots: Vec<FrameSlot>,
    current: usize,
    frame_number: u64,
    recording: bool,
}

impl FrameSlots {
    /// Create `config.frames_in_flight` slots; fences start signalled
    pub fn new(device: SharedDevice, config: &Config) -> Result<Self> {
        config.validate()?;

        let mut slots = Vec::with_capacity(config.frames_in_flight);
        for _ in 0..config.frames_in_flight {
            let (cmd, fence) = {
                let mut d = lock(&device, "device")?;
                let cmd = d.create_command_list()?;
                let fence = d.create_fence(true)?;
                (cmd, fence)
            };
            let descriptors = DynamicDescriptorPool::new(
                device.clone(),
                config.frame_pool_ratios.clone(),
                config.initial_sets_per_pool,
                config.max_sets_per_pool,
            );
            slots.push(FrameSlot { cmd, fence, descriptors });
        }

        engine_debug!("strata::FrameSlots", "Created {} frame slots", slots.len());
        Ok(Self { device, slots, current: 0, frame_number: 0, recording: false })
    }

    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }

    /// Slot the next `begin_frame` (or the frame being recorded) uses
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Number of frames submitted so far
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Wait for the current slot's previous frame, reset what it owns and
    /// open its command list
    pub fn begin_frame(&mut self) -> Result<Frame<'_>> {
        if self.recording {
            engine_bail!("strata::FrameSlots", "begin_frame called while frame {} is recording", self.frame_number);
        }

        let slot = &mut self.slots[self.current];
        lock(&self.device, "device")?.wait_fence(slot.fence, u64::MAX)?;
        slot.descriptors.clear()?;
        slot.cmd.begin()?;

        // Unsignal the fence last: only a submit signals it again
        if let Err(e) = lock(&self.device, "device").and_then(|mut d| d.reset_fence(slot.fence)) {
            let _ = slot.cmd.end();
            engine_error!("strata::FrameSlots", "Fence reset for frame {} failed: {}", self.frame_number, e);
            return Err(e);
        }
        self.recording = true;

        Ok(Frame {
            cmd: &mut *slot.cmd,
            descriptors: &mut slot.descriptors,
            index: self.current,
            frame_number: self.frame_number,
        })
    }

    /// The frame opened by `begin_frame`
    pub fn current_frame(&mut self) -> Result<Frame<'_>> {
        if !self.recording {
            return Err(Error::InvalidResource("no frame is recording".to_string()));
        }
        let slot = &mut self.slots[self.current];
        Ok(Frame {
            cmd: &mut *slot.cmd,
            descriptors: &mut slot.descriptors,
            index: self.current,
            frame_number: self.frame_number,
        })
    }

    /// End and submit the current frame, signalling the slot fence, then
    /// move to the next slot
    pub fn submit_frame(&mut self, waits: &[SemaphoreWait], signals: &[SemaphoreHandle]) -> Result<()> {
        if !self.recording {
            engine_bail!("strata::FrameSlots", "submit_frame called without begin_frame");
        }
        // The slot is no longer recording whatever happens below
        self.recording = false;

        let slot = &mut self.slots[self.current];
        slot.cmd.end()?;
        lock(&self.device, "device")?
            .submit(&[&*slot.cmd], waits, signals, Some(slot.fence))
            .map_err(|e| {
                engine_error!("strata::FrameSlots", "Submit of frame {} failed: {}", self.frame_number, e);
                e
            })?;

        self.current = (self.current + 1) % self.slots.len();
        self.frame_number += 1;
        Ok(())
    }

    /// Block until every slot's last submission has completed
    pub fn wait_all(&self) -> Result<()> {
        let device = lock(&self.device, "device")?;
        for slot in &self.slots {
            device.wait_fence(slot.fence, u64::MAX)?;
        }
        Ok(())
    }
}

impl Drop for FrameSlots {
    fn drop(&mut self) {
        if let Ok(mut device) = self.device.lock() {
            let _ = device.wait_idle();
            for slot in &self.slots {
                device.destroy_fence(slot.fence);
            }
        }
    }
}

#[cfg(test)]
#[path = "frame_slots_tests.rs"]
mod tests;
