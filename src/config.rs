pub mod constant {
    // Genetic solver defaults
    pub const POPULATION_SIZE: usize = 200;
    pub const GENERATIONS: usize = 150;
    pub const STAGNATION_LIMIT: usize = 30;
    pub const TOURNAMENT_SIZE: usize = 3;
    pub const ELITE_COUNT: usize = 2;
    pub const MUTATION_RATE: f64 = 0.2;
    pub const GREEDY_FRACTION: f64 = 0.3;
    pub const SOLVER_SEED: u64 = 67;

    // Cost weights: distance per km, time per minute, flat cost per vehicle
    // used, penalty per unassigned passenger (effectively a hard constraint).
    pub const DISTANCE_WEIGHT: f64 = 1.0;
    pub const TIME_WEIGHT: f64 = 1.0;
    pub const VEHICLE_WEIGHT: f64 = 10.0;
    pub const UNASSIGNED_PENALTY: f64 = 1000.0;

    // Straight-line estimation: great-circle distance times a road-network
    // calibration factor, travelled at a constant average speed.
    pub const DISTANCE_CALIBRATION: f64 = 1.3;
    pub const AVERAGE_SPEED_KMH: f64 = 30.0;

    // Scheduler timing
    pub const TICK_SECONDS: u64 = 60;
    pub const DRAIN_TIMEOUT_SECS: u64 = 30;
    pub const PROVIDER_TIMEOUT_SECS: u64 = 30;

    // Settings table keys (read every tick so admins can change them at runtime)
    pub const SETTING_SCHEDULING_ENABLED: &str = "SchedulingEnabled";
    pub const SETTING_SCHEDULING_TIME: &str = "SchedulingTime";
    pub const DEFAULT_SCHEDULING_TIME: &str = "06:00:00";

    pub const LOG_FILE: &str = "RideMatchScheduler.log";
    pub const DEFAULT_DATABASE_URL: &str = "sqlite:ridematch.sqlite";
    pub const PASSENGER_CSV_PATH: &str = "data/passengers.csv";
}
