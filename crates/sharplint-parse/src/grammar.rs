mod exprs;
mod items;
mod stmts;

pub(crate) use items::document;
