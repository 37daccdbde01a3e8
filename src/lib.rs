use std::{
    fs::{create_dir, File},
    sync::{LazyLock, Mutex},
};

use chrono::Local;

pub static TIMESTAMP: LazyLock<String> =
    LazyLock::new(|| Local::now().format("%Y-%m-%d_%H:%M:%S").to_string());

pub static LOGFILE: LazyLock<Mutex<File>> = LazyLock::new(|| {
    let _ = create_dir("console");
    Mutex::new(File::create(&("console/".to_string() + &TIMESTAMP + ".txt")).unwrap())
});

/// `println!` that also appends the line to this run's console log file.
#[macro_export]
macro_rules! logln {
    () => { {
            use std::io::Write;
        println!(); let _ = writeln!($crate::LOGFILE.lock().unwrap(), "");
    }};
    ($($arg:tt)*) => {
        {
            use std::io::Write;

            println!($($arg)*);
            let _ = writeln!($crate::LOGFILE.lock().unwrap(), $($arg)*);
        }
    };
}

pub mod comms;
pub mod config;
pub mod error;
pub mod missions;
pub mod vision;

pub use error::{DockError, DockResult};
