//! Fleet map engine.
//!
//! Projects tracked vehicles from latitude/longitude onto a raster surface,
//! fits the view around the fleet, draws grid, overlay, density heat, and
//! markers in a fixed order, resolves pointer clicks back to vehicles, and
//! keeps the data fresh with a cooperative refresh loop.
//!
//! Everything runs on one thread. The refresh loop only suspends on its
//! injected timer, and drawing and picking share one frame value so a
//! click is always resolved against what was drawn.

pub mod fleet;
pub mod geo;
pub mod live;
pub mod render;
pub mod state;
