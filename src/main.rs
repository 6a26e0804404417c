fn main() {
    #[cfg(feature = "cli")]
    smcodec::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("smcodec: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
