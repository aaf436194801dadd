pub(crate) mod kmeanplusplus;
pub(crate) mod randompartition;
pub(crate) mod randomsample;
