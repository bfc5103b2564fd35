fn main() {
    // The IPC shell needs the generated Tauri context; the core library does not.
    #[cfg(feature = "desktop")]
    tauri_build::build()
}
