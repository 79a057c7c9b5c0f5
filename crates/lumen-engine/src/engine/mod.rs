//! Interfaces of the collaborators the controller drives but does not own the
//! logic of: the visual engine and the audio sink feeding it.

use crate::coords::Extent;
use crate::gfx::GraphicsApi;

/// Opaque visual engine.
///
/// `render` draws into whatever target is bound when it is called. It holds
/// the full graphics context and may rebind the default target; the
/// controller detects that and does not rely on
/// [`set_respect_external_framebuffer`](Self::set_respect_external_framebuffer)
/// being honoured.
///
/// Errors are absorbed by the controller; none of them stop the frame loop.
pub trait RenderEngine<G: GraphicsApi + ?Sized> {
    /// Called once per surface creation with the initial render size.
    fn init(&mut self, gfx: &mut G, preset_path: &str, extent: Extent) -> anyhow::Result<()>;

    /// Draws one frame into the bound target.
    fn render(&mut self, gfx: &mut G) -> anyhow::Result<()>;

    /// Size the engine should lay its output out for. Best effort.
    fn set_window_size(&mut self, extent: Extent) -> anyhow::Result<()>;

    /// Asks the engine to leave externally bound targets alone. Best effort.
    fn set_respect_external_framebuffer(&mut self, enabled: bool) -> anyhow::Result<()>;
}

/// PCM consumer fed from the capture thread.
///
/// Implementations must not block: the caller is an audio callback.
pub trait AudioSink: Send + Sync {
    fn add_pcm(&self, samples: &[i16]);
}
