#![no_main]

use antwar::game::{Command, MARKER_QUOTAS, MIN_MARKER_SEPARATION, MarkerBoard, Vec2};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Op {
    Place { command: u8, x: i16, y: i16, heading: i16 },
    Remove { x: i16, y: i16 },
    Clear,
}

fn at(x: i16, y: i16) -> Vec2 {
    Vec2::new(f32::from(x) / 8.0, f32::from(y) / 8.0)
}

fuzz_target!(|ops: Vec<Op>| {
    let mut board = MarkerBoard::new(1);
    for op in ops.into_iter().take(512) {
        match op {
            Op::Place { command, x, y, heading } => {
                let command = Command::PLACEABLE[usize::from(command) % 9];
                let _ = board.place(command, at(x, y), f32::from(heading));
            }
            Op::Remove { x, y } => {
                board.remove_nearest(at(x, y));
            }
            Op::Clear => {
                board.clear();
            }
        }
    }

    for (slot, &command) in Command::PLACEABLE.iter().enumerate() {
        let placed = board.markers().iter().filter(|m| m.command == command).count();
        assert_eq!(usize::from(board.remaining(command)) + placed, usize::from(MARKER_QUOTAS[slot]));
    }
    let markers = board.markers();
    for (i, a) in markers.iter().enumerate() {
        for b in &markers[i + 1..] {
            assert!(a.position.distance(b.position) >= MIN_MARKER_SEPARATION);
        }
    }
});
