mod attributes;
mod campaign;
mod check;
mod preview;

pub(crate) use attributes::cmd_attributes;
pub(crate) use campaign::cmd_campaign;
pub(crate) use check::cmd_check;
pub(crate) use preview::cmd_preview;
