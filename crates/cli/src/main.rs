fn main() -> std::process::ExitCode {
    navigator_cli::run()
}
