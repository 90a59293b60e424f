// One module per signal family; each fills one value per window

mod density;
mod hands;
mod hold;
mod jack;
mod spread;

pub use density::{chord_strain, dampen_outliers, distinct_timestamps, nps};
pub use hands::{HandBalance, hand_balance};
pub use hold::ln_strain;
pub use jack::jack_pen;
pub use spread::roll_pen;
