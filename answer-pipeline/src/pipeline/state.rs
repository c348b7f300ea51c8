use state_machines::state_machine;

state_machine! {
    name: FunnelMachine,
    state: FunnelState,
    initial: Ready,
    states: [Ready, Ranked, Gated, Scored, Fused, Synthesized],
    events {
        rank { transition: { from: Ready, to: Ranked } }
        gate { transition: { from: Ranked, to: Gated } }
        score { transition: { from: Gated, to: Scored } }
        fuse { transition: { from: Scored, to: Fused } }
        synthesize { transition: { from: Fused, to: Synthesized } }
    }
}

pub fn ready() -> FunnelMachine<(), Ready> {
    FunnelMachine::new(())
}
