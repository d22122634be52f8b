//! Small guest programs run end to end through fetch, decode and execute

use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use gk_core::error::PpuError;
use gk_core::Config;
use gk_memory::{MemorySystem, GAMECUBE_CACHED_BASE};
use gk_ppu::Machine;
use proptest::prelude::*;

const BASE: u32 = GAMECUBE_CACHED_BASE;

fn load_program(code: &[u32]) -> Machine {
    let mut machine = Machine::new(MemorySystem::gamecube());
    let bytes: Vec<u8> = code.iter().flat_map(|word| word.to_be_bytes()).collect();
    machine.memory_mut().load_image(BASE, &bytes).unwrap();
    machine.set_pc(BASE);
    machine
}

#[test]
fn backward_branch_is_relative_to_itself() {
    // b .-4
    let mut machine = load_program(&[0x4BFF_FFFC]);
    machine.step().unwrap();
    assert_eq!(machine.pc(), 0x7FFF_FFFC);
}

#[test]
fn branch_to_self_stays_in_place() {
    // b .
    let mut machine = load_program(&[0x4800_0000]);
    machine.step().unwrap();
    assert_eq!(machine.pc(), BASE);
    machine.step().unwrap();
    assert_eq!(machine.pc(), BASE);
}

#[test]
fn li_then_addi() {
    // li r3, 10; addi r3, r3, 5
    let mut machine = load_program(&[0x3860_000A, 0x3863_0005]);
    machine.step().unwrap();
    machine.step().unwrap();
    assert_eq!(machine.regs.gpr(3), 15);
    assert_eq!(machine.pc(), BASE + 8);
}

#[test]
fn counted_loop_with_bdnz() {
    let code = [
        0x3860_0000, // li r3, 0
        0x3880_000A, // li r4, 10
        0x7C89_03A6, // mtctr r4
        0x7C63_2214, // loop: add r3, r3, r4
        0x3884_FFFF, // addi r4, r4, -1
        0x4200_FFF8, // bdnz loop
        0x4E80_0020, // blr
    ];
    let mut machine = load_program(&code);
    machine.run_function(BASE).unwrap();

    assert_eq!(machine.regs.gpr(3), 55);
    assert_eq!(machine.regs.ctr, 0);
    assert_eq!(machine.instruction_count(), 3 + 10 * 3 + 1);
}

#[test]
fn nested_call_saves_link_register() {
    let code = [
        0x7C08_02A6, // mflr r0
        0x9421_FFF0, // stwu r1, -16(r1)
        0x9001_0014, // stw r0, 20(r1)
        0x4800_0015, // bl callee
        0x8001_0014, // lwz r0, 20(r1)
        0x3821_0010, // addi r1, r1, 16
        0x7C08_03A6, // mtlr r0
        0x4E80_0020, // blr
        0x3860_002A, // callee: li r3, 42
        0x4E80_0020, // blr
    ];
    let mut machine = load_program(&code);
    let stack = BASE + 0x10_0000;
    machine.regs.set_gpr(1, stack);

    machine.run_function(BASE).unwrap();

    assert_eq!(machine.regs.gpr(3), 42);
    assert_eq!(machine.regs.gpr(1), stack);
    assert_eq!(machine.pc(), machine.return_sentinel());
    assert_eq!(
        machine.memory().read_be32(stack - 16 + 20).unwrap(),
        machine.return_sentinel()
    );
}

#[test]
fn register_save_and_restore_with_multiple_word_transfers() {
    let code = [
        0xBFA1_FFF4, // stmw r29, -12(r1)
        0x3BA0_0000, // li r29, 0
        0x3BC0_0000, // li r30, 0
        0x3BE0_0000, // li r31, 0
        0xBBA1_FFF4, // lmw r29, -12(r1)
        0x4E80_0020, // blr
    ];
    let mut machine = load_program(&code);
    machine.regs.set_gpr(1, BASE + 0x1000);
    machine.regs.set_gpr(29, 0x2929);
    machine.regs.set_gpr(30, 0x3030);
    machine.regs.set_gpr(31, 0x3131);

    machine.run_function(BASE).unwrap();

    assert_eq!(machine.regs.gpr(29), 0x2929);
    assert_eq!(machine.regs.gpr(30), 0x3030);
    assert_eq!(machine.regs.gpr(31), 0x3131);
}

#[test]
fn unsupported_opcode_stops_function() {
    // li r3, 1; lfs f1, 0(r1)
    let mut machine = load_program(&[0x3860_0001, 0xC021_0000]);
    let err = machine.run_function(BASE).unwrap_err();
    assert!(matches!(err, PpuError::UnsupportedOpcode { primary: 48, .. }));
    assert_eq!(machine.pc(), BASE + 4);
    assert_eq!(machine.regs.gpr(3), 1);
}

#[test]
fn stop_handle_interrupts_run_from_another_thread() {
    // b .
    let mut machine = load_program(&[0x4800_0000]);
    let stop = machine.stop_handle();

    let worker = thread::spawn(move || {
        machine.run().unwrap();
        machine
    });
    thread::sleep(Duration::from_millis(20));
    stop.store(true, Ordering::Relaxed);

    let machine = worker.join().unwrap();
    assert_eq!(machine.pc(), BASE);
    assert!(machine.instruction_count() > 0);
}

#[test]
fn stop_handle_interrupts_function_that_never_returns() {
    // b .
    let mut machine = load_program(&[0x4800_0000]);
    let stop = machine.stop_handle();

    let worker = thread::spawn(move || {
        let result = machine.run_function(BASE);
        (result, machine)
    });
    thread::sleep(Duration::from_millis(20));
    stop.store(true, Ordering::Relaxed);

    let (result, machine) = worker.join().unwrap();
    assert!(result.is_ok());
    assert!(!stop.load(Ordering::Relaxed));
    assert_ne!(machine.pc(), machine.return_sentinel());
    assert_eq!(machine.pc(), BASE);
    assert_eq!(machine.regs.lr, machine.return_sentinel());
    assert!(machine.instruction_count() > 0);
}

#[test]
fn default_config_builds_gamecube_machine() {
    let machine = Machine::from_config(&Config::default()).unwrap();
    let preset = MemorySystem::gamecube();

    let sections = machine.memory().sections();
    assert_eq!(sections.len(), preset.sections().len());
    assert_eq!(sections[0].region(), preset.sections()[0].region());
    assert_eq!(machine.return_sentinel(), 0xDEAD_BEE0);
}

proptest! {
    #[test]
    fn cmpwi_then_blt(r4 in any::<i32>()) {
        let code = [
            0x2C04_FFFF, // cmpwi r4, -1
            0x4180_0008, // blt .+8
        ];
        let mut machine = load_program(&code);
        machine.regs.set_gpr(4, r4 as u32);

        machine.step().unwrap();
        machine.step().unwrap();

        let expected = if r4 < -1 { BASE + 12 } else { BASE + 8 };
        prop_assert_eq!(machine.pc(), expected);
    }

    #[test]
    fn rlwinm_full_mask_is_identity(value in any::<u32>()) {
        // rlwinm r3, r4, 0, 0, 31
        let mut machine = load_program(&[0x5483_003E]);
        machine.regs.set_gpr(4, value);
        machine.step().unwrap();
        prop_assert_eq!(machine.regs.gpr(3), value);
    }
}
