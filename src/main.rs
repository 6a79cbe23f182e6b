use authpulse::status::ExitStatus;

/// Entry point
///
/// Returns ExitStatus directly, which implements std::process::Termination.
fn main() -> ExitStatus {
    let args: Vec<String> = std::env::args().collect();
    authpulse::core::run(args)
}
