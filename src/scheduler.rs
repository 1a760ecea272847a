//! # Priority-with-aging scheduler
//!
//! Selection is a pure sweep over the PCB table. Every runnable slot
//! is scored as `priority + age + niceness`; the highest score wins
//! and ties go to the lowest index. The winner's age resets to zero
//! while every other slot in the active range ages by one, so a
//! waiting process's score climbs one point per scheduling tick and
//! must eventually overtake any fixed bias. That monotone climb is
//! the starvation bound.
//!
//! Niceness is the user-facing knob, clamped to [-20, 19] with the
//! sign inverted from the usual Unix reading: a niceness of 19 is the
//! strongest boost, -20 the strongest handicap.
//!
//! The aging sweep deliberately touches non-runnable slots too. Dead
//! slots are never selected, so their ticking age is invisible; the
//! sweep stays a single unconditional pass.

use crate::context::Context;
use crate::kernel::Kernel;
use crate::process::Status;
use crate::serial::Serial;

impl<S: Serial> Kernel<S> {
    /// One scheduling decision: pick the next slot, account ages,
    /// swap contexts and fix up statuses. Runs on every timer tick
    /// and on the syscalls that reschedule.
    pub fn schedule(&mut self, ctx: &mut Context) {
        let live = self.live_slots();

        // highest effective priority wins, lowest index breaks ties
        let mut next = 0;
        let mut best = i32::MIN;
        for i in 0..live {
            let pcb = &self.procs[i];
            if pcb.is_runnable() && pcb.effective_priority() > best {
                best = pcb.effective_priority();
                next = i;
            }
        }

        // the winner starts waiting from zero, everyone else ages
        self.procs[next].age = 0;
        for i in 0..live {
            if i != next {
                self.procs[i].age += 1;
            }
        }

        // locate the slot of the process being descheduled
        let mut current = next;
        if let Some(cursor) = self.executing {
            let pid = self.procs[cursor].pid;
            for i in 0..live {
                if self.procs[i].pid == pid {
                    current = i;
                }
            }
        }

        self.dispatch(ctx, Some(current), next);

        if self.procs[current].status == Status::Executing {
            self.procs[current].status = Status::Ready;
        }
        self.procs[next].status = Status::Executing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Pcb;
    use crate::testkit::{assert_single_executing, boot, trace};

    /// Stand up `extra` ready processes next to the console, bypassing
    /// fork, so policy tests control every field.
    fn boot_with_ready(extra: usize) -> (Kernel<crate::testkit::TraceLog>, Context) {
        let (mut kernel, ctx) = boot();
        for i in 1..=extra {
            kernel.procs[i] = Pcb::EMPTY;
            kernel.procs[i].pid = i;
            kernel.procs[i].status = Status::Ready;
        }
        kernel.active_procs = 1 + extra;
        kernel.serial.log.clear();
        (kernel, ctx)
    }

    #[test]
    fn solo_process_reschedules_to_itself() {
        let (mut kernel, mut ctx) = boot_with_ready(0);
        kernel.schedule(&mut ctx);
        assert_eq!(trace(&kernel), "[0->0]");
        assert_eq!(kernel.procs[0].status, Status::Executing);
        assert_eq!(kernel.procs[0].age, 0);
        assert_single_executing(&kernel);
    }

    #[test]
    fn ties_break_to_the_lowest_index() {
        let (mut kernel, mut ctx) = boot_with_ready(2);
        // all three slots score 15 + 0 + 0
        kernel.schedule(&mut ctx);
        assert_eq!(kernel.executing, Some(0));
    }

    #[test]
    fn aging_lets_the_waiter_overtake() {
        let (mut kernel, mut ctx) = boot_with_ready(1);

        // equal scores: slot 0 retains the CPU, slot 1 ages to 16
        kernel.schedule(&mut ctx);
        assert_eq!(kernel.executing, Some(0));
        assert_eq!(kernel.procs[1].age, 1);

        // 16 beats 15: slot 1 wins and its age resets
        kernel.schedule(&mut ctx);
        assert_eq!(kernel.executing, Some(1));
        assert_eq!(kernel.procs[1].age, 0);
        assert_eq!(kernel.procs[0].age, 1);
        assert_eq!(kernel.procs[0].status, Status::Ready);
        assert_eq!(kernel.procs[1].status, Status::Executing);
        assert_single_executing(&kernel);
    }

    #[test]
    fn niceness_biases_selection_until_age_catches_up() {
        let (mut kernel, mut ctx) = boot_with_ready(1);
        kernel.procs[0].niceness = -20;
        kernel.procs[1].niceness = 19;

        // 34 beats -5 outright
        kernel.schedule(&mut ctx);
        assert_eq!(kernel.executing, Some(1));

        // the handicapped slot needs 39 points of age to tie, and the
        // tie then breaks its way (lower index)
        for _ in 0..38 {
            kernel.schedule(&mut ctx);
            assert_eq!(kernel.executing, Some(1));
        }
        kernel.schedule(&mut ctx);
        assert_eq!(kernel.executing, Some(0));
    }

    #[test]
    fn terminated_slots_never_win_but_still_age() {
        let (mut kernel, mut ctx) = boot_with_ready(2);
        kernel.procs[1].status = Status::Terminated;
        kernel.procs[1].age = 1000;

        kernel.schedule(&mut ctx);
        assert_eq!(kernel.executing, Some(0));
        // the sweep aged the dead slot anyway
        assert_eq!(kernel.procs[1].age, 1001);
        // and a terminated current is not resurrected to READY
        assert_eq!(kernel.procs[1].status, Status::Terminated);
    }

    #[test]
    fn every_ready_process_is_selected_within_a_bound() {
        let (mut kernel, mut ctx) = boot_with_ready(3);
        // spread the bias as far apart as the knob allows
        kernel.procs[0].niceness = 19;
        kernel.procs[1].niceness = 5;
        kernel.procs[2].niceness = -7;
        kernel.procs[3].niceness = -20;

        let mut selected = [false; 4];
        // worst-case gap is 39 points; 4 slots * 40 ticks is ample
        for _ in 0..160 {
            kernel.schedule(&mut ctx);
            selected[kernel.executing.unwrap()] = true;
            assert_single_executing(&kernel);
        }
        assert_eq!(selected, [true; 4], "a slot starved: {:?}", selected);
    }

    #[test]
    fn age_stays_bounded_by_wait_time() {
        let (mut kernel, mut ctx) = boot_with_ready(1);
        for tick in 1..=10 {
            kernel.schedule(&mut ctx);
            for i in 0..2 {
                assert!(kernel.procs[i].age >= 0);
                assert!(kernel.procs[i].age <= tick);
            }
        }
    }
}
