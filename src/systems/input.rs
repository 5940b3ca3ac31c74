use crate::errors::Result;
use crate::input::{InputChannel, InputPublisher};
use crate::scene::SceneTree;
use crate::systems::{EngineSystem, order};
use crate::utils::Time;

/// Feeds the bound [`Input`](crate::input::Input) service from the event
/// channel, once per frame before the tree is processed.
#[derive(Debug)]
pub struct InputSystem {
    channel: InputChannel,
}

impl InputSystem {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            channel: InputChannel::new(capacity),
        }
    }

    /// A new publishing handle for platform adapters.
    #[must_use]
    pub fn publisher(&self) -> InputPublisher {
        self.channel.publisher()
    }

    #[must_use]
    pub fn channel(&self) -> &InputChannel {
        &self.channel
    }
}

impl EngineSystem for InputSystem {
    fn name(&self) -> &str {
        "input"
    }

    fn order(&self) -> i32 {
        order::INPUT
    }

    fn update(&mut self, tree: &mut SceneTree, _time: &Time) -> Result<()> {
        let input = tree.input_mut()?;
        input.start_frame();
        self.channel.drain_into(input);
        Ok(())
    }
}
