use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Feed;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Add, List, Follow, Following, Unfollow }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Add => "add",
        Phase::List => "list",
        Phase::Follow => "follow",
        Phase::Following => "following",
        Phase::Unfollow => "unfollow",
    }}
    fn span(&self) -> Span { match self {
        Phase::Add => info_span!("add"),
        Phase::List => info_span!("list"),
        Phase::Follow => info_span!("follow"),
        Phase::Following => info_span!("following"),
        Phase::Unfollow => info_span!("unfollow"),
    }}
}

impl OpMarker for Feed {
    const NAME: &'static str = "feed";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("feed") }
}
