pub(crate) mod coalesce;
pub(crate) mod document;
pub(crate) mod table;
