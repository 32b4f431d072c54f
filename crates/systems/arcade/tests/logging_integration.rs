//! Logging integration: enabling every category, with output to a file,
//! must not change what the board does.

use emu_arcade::{ArcadeSystem, Lane};
use emu_core::logging::{LogCategory, LogConfig, LogLevel};
use emu_core::System;

fn exercise(sys: &mut ArcadeSystem) -> (u32, u8, u8) {
    let board = sys.board_mut();
    board.write(Lane::A, 0xC700, 0);
    board.read(Lane::B, 0xC700);
    board.read(Lane::B, 0xC700);
    board.write(Lane::A, 0xC400, 0x42);
    board.write(Lane::A, 0x0000, 0x00);
    board.write(Lane::Sound, 0xD000, 0x01);
    let nmi = board.latch_mut().take_interrupts(Lane::A);
    let status = board.read(Lane::Sound, 0xF800);
    let command = board.read(Lane::Sound, 0xE000);
    sys.step_frame().unwrap();
    (nmi, status, command)
}

#[test]
fn test_logging_does_not_change_behaviour() {
    let mut quiet = ArcadeSystem::for_title("ikari").unwrap();
    let expected = exercise(&mut quiet);

    let config = LogConfig::global();
    for category in LogCategory::ALL {
        config.set_level(category, LogLevel::Trace);
    }
    let path = std::env::temp_dir().join("emu_arcade_logging_integration.log");
    config.set_log_file(path).unwrap();

    let mut loud = ArcadeSystem::for_title("ikari").unwrap();
    let observed = exercise(&mut loud);

    config.clear_log_file();
    config.reset();

    assert_eq!(observed, expected);
    assert_eq!(expected, (1, 0x0C, 0x42));
    assert_eq!(
        loud.debug_state()["doorbell"],
        quiet.debug_state()["doorbell"]
    );
}
