fn main() {
    std::process::exit(webthon_compiler::cli::run_cli());
}
