use chain_hash::GrowthCheck;
use chain_hash::HashTable;
use chain_hash::InsertError;
use chain_hash::LogEvents;
use chain_hash::TableConfig;
use clap::Parser;
use clap::ValueEnum;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "initial-capacity", default_value_t = 13)]
    initial_capacity: usize,

    #[arg(short = 'n', long = "employees", default_value_t = 1000)]
    employees: usize,

    #[arg(short = 'l', long = "max-load-factor", default_value_t = 0.75)]
    max_load_factor: f64,

    #[arg(long = "growth-check", value_enum, default_value_t = Check::Projected)]
    growth_check: Check,

    #[arg(long = "seed", default_value_t = 0x5eed)]
    seed: u64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Check {
    Projected,
    Current,
}

impl From<Check> for GrowthCheck {
    fn from(check: Check) -> Self {
        match check {
            Check::Projected => GrowthCheck::Projected,
            Check::Current => GrowthCheck::Current,
        }
    }
}

#[derive(Debug, Clone)]
struct Employee {
    name: String,
    department: &'static str,
    salary: f64,
}

const DEPARTMENTS: [&str; 4] = ["Engineering", "Sales", "Marketing", "Operations"];

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = TableConfig::default()
        .initial_capacity(args.initial_capacity)
        .max_load_factor(args.max_load_factor)
        .growth_check(args.growth_check.into());
    let mut table: HashTable<u32, Employee> = match HashTable::with_config(config) {
        Ok(table) => table,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            std::process::exit(2);
        }
    };

    println!(
        "Created table with capacity {} (requested {})",
        table.capacity(),
        args.initial_capacity
    );

    let mut rng = SmallRng::seed_from_u64(args.seed);
    let id_range = 100..100 + (args.employees as u32).max(1) * 4;
    let mut duplicates = 0;
    let mut rehashes = 0;
    let mut last_capacity = table.capacity();

    while table.len() < args.employees {
        let id = rng.random_range(id_range.clone());
        let employee = Employee {
            name: format!("employee_{id}"),
            department: DEPARTMENTS[rng.random_range(0..DEPARTMENTS.len())],
            salary: rng.random_range(40_000.0..150_000.0),
        };

        match table.insert_with(id, employee, LogEvents) {
            Ok(()) => {}
            Err(InsertError::DuplicateKey { .. }) => duplicates += 1,
            Err(err) => {
                eprintln!("insert failed: {err}");
                break;
            }
        }

        if table.capacity() != last_capacity {
            rehashes += 1;
            println!(
                "  rehash #{rehashes}: {last_capacity} -> {} buckets at {} employees",
                table.capacity(),
                table.len()
            );
            last_capacity = table.capacity();
        }
    }

    println!(
        "Inserted {} employees ({} duplicate ids rejected)",
        table.len(),
        duplicates
    );

    let probes = 1_000;
    let mut hits = 0;
    let mut comparisons = 0;
    for _ in 0..probes {
        let id = rng.random_range(id_range.clone());
        let (found, compared) = table.search_with_comparisons(&id);
        hits += found.is_some() as usize;
        comparisons += compared;
    }
    println!(
        "{probes} lookups: {hits} hits, {:.2} comparisons per lookup",
        comparisons as f64 / probes as f64
    );

    for department in DEPARTMENTS {
        let (count, payroll) = table
            .values()
            .filter(|e| e.department == department)
            .fold((0usize, 0.0f64), |(n, total), e| (n + 1, total + e.salary));
        println!("  {department:<12} {count:>6} employees, payroll {payroll:>14.2}");
    }
    if let Some((id, employee)) = table.iter().next() {
        println!("First record in table order: {id} ({})", employee.name);
    }

    println!();
    println!("{}", table.stats());
    println!();
    println!("Chain length histogram:");
    for (len, buckets) in table.chain_histogram().iter().enumerate() {
        println!("  {len:>3}: {buckets}");
    }
}
