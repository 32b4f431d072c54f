use emu_arcade::ArcadeSystem;
use emu_core::System;
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();
    let title = args.get(1).map(|s| s.as_str()).unwrap_or("ikari");

    match ArcadeSystem::for_title(title) {
        Ok(mut sys) => {
            let frame = sys.step_frame().unwrap();
            println!("Headless {} frame: {}x{}", title, frame.width, frame.height);
            println!("Debug state: {}", serde_json::to_string_pretty(&sys.debug_state()).unwrap());
        }
        Err(err) => eprintln!("{}", err),
    }
}
