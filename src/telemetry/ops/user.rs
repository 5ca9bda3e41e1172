use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct User;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Plan, Register, Login, List, Reset }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Plan => "plan",
        Phase::Register => "register",
        Phase::Login => "login",
        Phase::List => "list",
        Phase::Reset => "reset",
    }}
    fn span(&self) -> Span { match self {
        Phase::Plan => info_span!("plan"),
        Phase::Register => info_span!("register"),
        Phase::Login => info_span!("login"),
        Phase::List => info_span!("list"),
        Phase::Reset => info_span!("reset"),
    }}
}

impl OpMarker for User {
    const NAME: &'static str = "user";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("user") }
}
