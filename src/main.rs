fn main() -> Result<(), Box<dyn std::error::Error>> {
    causerie::cli::main()
}
