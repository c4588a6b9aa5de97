pub(crate) mod calculate;
pub(crate) mod heirs;
pub(crate) mod rules;
