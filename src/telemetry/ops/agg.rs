use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Agg;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Cycle, Select, MarkFetched, Fetch, Item, Wait }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Cycle => "cycle",
        Phase::Select => "select",
        Phase::MarkFetched => "mark_fetched",
        Phase::Fetch => "fetch",
        Phase::Item => "item",
        Phase::Wait => "wait",
    }}
    fn span(&self) -> Span { match self {
        Phase::Cycle => info_span!("cycle"),
        Phase::Select => info_span!("select"),
        Phase::MarkFetched => info_span!("mark_fetched"),
        Phase::Fetch => info_span!("fetch"),
        Phase::Item => info_span!("item"),
        Phase::Wait => info_span!("wait"),
    }}
}

impl OpMarker for Agg {
    const NAME: &'static str = "agg";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("agg") }
}
