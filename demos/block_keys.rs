//! Block specific keys from reaching other apps while tracking held keys.
//!
//! Run with: cargo run --example block_keys
//!
//! IMPORTANT: This will actually block keys! Press Ctrl+C to exit.
//!
//! The Q, W and E keys are swallowed. Every other key passes through and is
//! printed together with the set of keys currently held.

#[cfg(target_os = "windows")]
fn main() {
    use keyhook::{DeliveryMode, Key, KeyboardHook, listener};
    use std::sync::atomic::{AtomicU32, Ordering};
    use windows::Win32::Foundation::{LPARAM, WPARAM};
    use windows::Win32::System::Threading::GetCurrentThreadId;
    use windows::Win32::UI::WindowsAndMessaging::{GetMessageW, MSG, PostThreadMessageW, WM_QUIT};

    static BLOCKED_COUNT: AtomicU32 = AtomicU32::new(0);

    println!("keyhook block_keys example");
    println!("==========================\n");
    println!("Q, W and E are blocked. Press Ctrl+C to exit.\n");

    let hook = KeyboardHook::global();

    hook.add_key_down_listener(listener(|key| match key {
        Key::KeyQ | Key::KeyW | Key::KeyE => {
            let count = BLOCKED_COUNT.fetch_add(1, Ordering::SeqCst) + 1;
            println!("BLOCKED {:?} (total blocked: {})", key, count);
            true
        }
        _ => {
            println!(
                "down {:?} held={:?}",
                key,
                KeyboardHook::global().pressed_keys()
            );
            false
        }
    }));
    hook.add_key_up_listener(listener(|key| {
        println!("up   {:?}", key);
        false
    }));

    if let Err(e) = hook.start(DeliveryMode::Background) {
        eprintln!("Error: {}", e);
        return;
    }

    // The low-level hook is serviced by this thread's message loop
    let thread_id = unsafe { GetCurrentThreadId() };
    ctrlc::set_handler(move || unsafe {
        let _ = PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
    })
    .expect("Failed to set Ctrl+C handler");

    let mut msg = MSG::default();
    unsafe { while GetMessageW(&mut msg, None, 0, 0).as_bool() {} }

    hook.stop();
    println!("\nStopped. Total blocked: {}", BLOCKED_COUNT.load(Ordering::SeqCst));
}

#[cfg(not(target_os = "windows"))]
fn main() {
    let hook = keyhook::KeyboardHook::global();
    if let Err(e) = hook.start(keyhook::DeliveryMode::Background) {
        eprintln!("Error: {}", e);
    }
}
