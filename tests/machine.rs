//! Machine-level scenarios: whole ticks against a real strip buffer.

use glimmer::program::asm::Asm;
use glimmer::program::{MODE_PER_LED, MODE_PER_TICK};
use glimmer::scheduler::{Machine, TickOutcome};
use glimmer::strip::StripState;
use glimmer::vm::Opcode::*;

/// Advance one tick the way the scheduler does, including the counter
/// increment on completion.
fn tick(machine: &mut Machine, strip: &mut StripState) -> TickOutcome {
    let outcome = machine.run_tick(strip);
    if outcome == TickOutcome::Completed {
        machine.ctx.ticks += 1;
    }
    outcome
}

#[test]
fn per_led_pass_writes_each_led_its_own_index() {
    let image = Asm::new()
        .op(GetPos).reg(0)
        .op(RedR).reg(0)
        .finish(MODE_PER_LED);

    let mut machine = Machine::new();
    machine.install(&image, true).unwrap();
    let mut strip = StripState::new(4);

    assert_eq!(tick(&mut machine, &mut strip), TickOutcome::Completed);
    assert_eq!(
        strip.data,
        vec![[0, 0, 0], [1, 0, 0], [2, 0, 0], [3, 0, 0]]
    );
}

#[test]
fn per_tick_program_walks_the_strip_itself() {
    // r0 counts down from the LED count; each iteration positions one LED
    // and writes its index into component 1.
    let image = Asm::new()
        .op(GetNumLeds).reg(0)
        // loop head at byte 4
        .op(CleI).reg(0).imm(0.0)
        .op(HaltT)
        .op(AddI).reg(0).reg(0).imm(-1.0)
        .op(PosR).reg(0)
        .op(GreenR).reg(0)
        .op(Goto).addr(4)
        .finish(MODE_PER_TICK);

    let mut machine = Machine::new();
    machine.install(&image, true).unwrap();
    let mut strip = StripState::new(4);

    assert_eq!(tick(&mut machine, &mut strip), TickOutcome::Completed);
    assert_eq!(
        strip.data,
        vec![[0, 0, 0], [0, 1, 0], [0, 2, 0], [0, 3, 0]]
    );
}

#[test]
fn minimal_sentinel_only_program_ticks_without_touching_the_buffer() {
    let mut machine = Machine::new();
    machine.install(&[0xFF; 8], false).unwrap();
    let mut strip = StripState::new(4);

    assert_eq!(tick(&mut machine, &mut strip), TickOutcome::Completed);
    assert!(strip.data.iter().all(|led| *led == [0, 0, 0]));
}

#[test]
fn identical_programs_and_rng_state_replay_identically() {
    let image = Asm::new()
        .op(GetRng).reg(0)
        .op(MulI).reg(0).reg(0).imm(255.0)
        .op(RedR).reg(0)
        .op(GetRng).reg(1)
        .op(MulI).reg(1).reg(1).imm(255.0)
        .op(BlueR).reg(1)
        .finish(MODE_PER_LED);

    let mut a = Machine::new();
    let mut b = Machine::new();
    a.install(&image, true).unwrap();
    b.install(&image, true).unwrap();

    let mut strip_a = StripState::new(8);
    let mut strip_b = StripState::new(8);

    for _ in 0..10 {
        assert_eq!(tick(&mut a, &mut strip_a), TickOutcome::Completed);
        assert_eq!(tick(&mut b, &mut strip_b), TickOutcome::Completed);
        assert_eq!(strip_a.data, strip_b.data);
    }

    assert_eq!(a.ctx.rng, b.ctx.rng);
    // The generator actually moved: something wrote a nonzero component
    // over ten ticks of eight passes each.
    assert!(strip_a.data.iter().any(|led| led[0] > 0 || led[2] > 0));
}

#[test]
fn invalid_opcode_is_contained_to_one_tick() {
    let image = Asm::new().raw(0x4D).finish(MODE_PER_LED);

    let mut machine = Machine::new();
    machine.install(&image, true).unwrap();
    let mut strip = StripState::new(4);

    // The faulting tick: no sleep, no counter increment, indicator installed.
    assert_eq!(tick(&mut machine, &mut strip), TickOutcome::Faulted);
    assert_eq!(machine.last_fault.as_deref(), Some("invalid opcode 4d"));

    // Next tick runs the indicator: solid red on tick 0.
    assert_eq!(tick(&mut machine, &mut strip), TickOutcome::Completed);
    assert!(strip.data.iter().all(|led| *led == [255, 0, 0]));

    // And dark on tick 1; the loop keeps ticking, nothing is wedged.
    assert_eq!(tick(&mut machine, &mut strip), TickOutcome::Completed);
    assert!(strip.data.iter().all(|led| *led == [0, 0, 0]));

    assert_eq!(tick(&mut machine, &mut strip), TickOutcome::Completed);
    assert!(strip.data.iter().all(|led| *led == [255, 0, 0]));
}

#[test]
fn indicator_persists_until_a_fresh_upload_replaces_it() {
    let bad = Asm::new().raw(0xEE).finish(MODE_PER_LED);
    let good = Asm::new()
        .op(BlueI).imm(7.0)
        .finish(MODE_PER_LED);

    let mut machine = Machine::new();
    machine.install(&bad, true).unwrap();
    let mut strip = StripState::new(2);

    assert_eq!(tick(&mut machine, &mut strip), TickOutcome::Faulted);
    for _ in 0..5 {
        assert_eq!(tick(&mut machine, &mut strip), TickOutcome::Completed);
    }

    machine.install(&good, true).unwrap();
    assert_eq!(tick(&mut machine, &mut strip), TickOutcome::Completed);
    assert!(strip.data.iter().all(|led| *led == [0, 0, 7]));
}

#[test]
fn jump_to_self_exhausts_the_instruction_budget() {
    let image = Asm::new().op(Goto).addr(2).finish(MODE_PER_LED);

    let mut machine = Machine::new();
    machine.install(&image, true).unwrap();
    let mut strip = StripState::new(4);

    assert_eq!(tick(&mut machine, &mut strip), TickOutcome::Faulted);
    assert_eq!(machine.last_fault.as_deref(), Some("exceeded instruction cap"));
}

#[test]
fn division_by_zero_reports_the_mnemonic() {
    let image = Asm::new()
        .op(MovI).reg(0).imm(3.0)
        .op(DivR).reg(1).reg(0).reg(2)
        .finish(MODE_PER_LED);

    let mut machine = Machine::new();
    machine.install(&image, true).unwrap();
    let mut strip = StripState::new(1);

    assert_eq!(tick(&mut machine, &mut strip), TickOutcome::Faulted);
    assert_eq!(machine.last_fault.as_deref(), Some("divr by zero"));
}

#[test]
fn off_strip_position_faults_with_the_position() {
    let image = Asm::new().op(PosI).imm(4.0).finish(MODE_PER_LED);

    let mut machine = Machine::new();
    machine.install(&image, true).unwrap();
    let mut strip = StripState::new(4);

    assert_eq!(tick(&mut machine, &mut strip), TickOutcome::Faulted);
    assert_eq!(
        machine.last_fault.as_deref(),
        Some("tried to set led outside the strip (position 4)")
    );
}

#[test]
fn install_resets_ticks_and_period_but_not_rng() {
    let image = Asm::new()
        .op(PeriodI).imm(20.0)
        .finish(MODE_PER_LED);

    let mut machine = Machine::new();
    machine.install(&image, true).unwrap();
    let mut strip = StripState::new(2);

    for _ in 0..3 {
        tick(&mut machine, &mut strip);
    }
    assert_eq!(machine.ctx.ticks, 3);
    assert_eq!(machine.ctx.period_ms, 20);
    let rng_before = machine.ctx.rng;
    assert_ne!(rng_before, 0);

    machine.install(&image, true).unwrap();
    assert_eq!(machine.ctx.ticks, 0);
    assert_eq!(machine.ctx.period_ms, 1000);
    assert_eq!(machine.ctx.rng, rng_before);
}
