use askama::Template;

use crate::pkg::internal::adaptors::evaluations::spec::EvaluationEntry;

#[derive(Template)]
#[template(path = "home.html")]
pub struct Home<'a> {
    pub username: &'a str,
    pub evaluations: Vec<EvaluationEntry>,
}

#[derive(Template)]
#[template(path = "verify.html")]
pub struct Verify {}
