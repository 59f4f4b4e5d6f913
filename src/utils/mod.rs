pub(crate) mod domain;
pub(crate) mod matching;
pub(crate) mod patterns;
