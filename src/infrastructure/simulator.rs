// Simulated sensor producers - stand-ins for the robot's hardware drivers
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::application::sensor_source::SensorSource;
use crate::domain::telemetry::{BatteryReading, ImuReading, MotorReading, SampleError, SensorFrame};
use crate::infrastructure::config::SimulationSettings;

const MIN_MOTOR_TEMP: f64 = 25.0;
const MAX_MOTOR_TEMP: f64 = 95.0;
const HEATING_RATE: f64 = 0.1;
const COOLING_RATE: f64 = 0.02;
const MAX_SLIP: f64 = 0.35;

#[derive(Debug, Clone)]
pub struct MotorSimulator {
    time: f64,
    temperature: f64,
    left_slip: f64,
    right_slip: f64,
    current_idle: f64,
    current_span: f64,
}

impl MotorSimulator {
    pub fn new(current_idle: f64, current_span: f64) -> Self {
        Self {
            time: 0.0,
            temperature: MIN_MOTOR_TEMP,
            left_slip: 0.0,
            right_slip: 0.0,
            current_idle,
            current_span,
        }
    }

    pub fn update<R: Rng>(&mut self, dt: f64, rng: &mut R) -> MotorReading {
        self.time += dt;

        // Smooth duty cycle between 0.3 and 0.8.
        let load = 0.3 + 0.5 * (0.5 + 0.5 * (self.time * 0.2).sin());

        self.temperature += (load * HEATING_RATE - COOLING_RATE) * dt;
        self.temperature = self.temperature.clamp(MIN_MOTOR_TEMP, MAX_MOTOR_TEMP);

        let vibration = 0.05 + 0.15 * load + 0.03 * rng.gen_range(0.0..1.0);

        self.left_slip = step_slip(self.left_slip, rng);
        self.right_slip = step_slip(self.right_slip, rng);

        MotorReading {
            temperature: self.temperature,
            vibration,
            load,
            current: self.current_idle + self.current_span * load,
            left_slip: self.left_slip,
            right_slip: self.right_slip,
        }
    }
}

fn step_slip<R: Rng>(slip: f64, rng: &mut R) -> f64 {
    (slip + rng.gen_range(-0.02..0.03)).clamp(0.0, MAX_SLIP)
}

#[derive(Debug, Clone)]
pub struct BatterySimulator {
    capacity_mah: f64,
    max_capacity_mah: f64,
    nominal_voltage: f64,
    voltage_drop: f64,
}

impl BatterySimulator {
    pub fn new(settings: &SimulationSettings) -> Self {
        Self {
            capacity_mah: settings.initial_capacity_mah,
            max_capacity_mah: settings.max_capacity_mah,
            nominal_voltage: settings.nominal_voltage,
            voltage_drop: settings.voltage_drop,
        }
    }

    /// Drains `current` amps for `dt` seconds.
    pub fn update(&mut self, current: f64, dt: f64) -> BatteryReading {
        self.capacity_mah = (self.capacity_mah - current * 1000.0 * dt / 3600.0).max(0.0);
        let charge_percent = self.capacity_mah / self.max_capacity_mah * 100.0;
        let voltage = self.nominal_voltage * (charge_percent / 100.0) - self.voltage_drop;

        BatteryReading {
            voltage,
            capacity_mah: self.capacity_mah,
            charge_percent,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImuSimulator {
    accel_noise: f64,
    gravity: f64,
    angular_rate_limit: f64,
}

impl ImuSimulator {
    pub fn new(accel_noise: f64, gravity: f64, angular_rate_limit: f64) -> Self {
        Self {
            accel_noise,
            gravity,
            angular_rate_limit,
        }
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> ImuReading {
        ImuReading {
            acc_x: rng.gen_range(-self.accel_noise..=self.accel_noise),
            acc_y: rng.gen_range(-self.accel_noise..=self.accel_noise),
            acc_z: rng.gen_range(self.gravity - 0.5..=self.gravity + 0.5),
            angular_rate: rng.gen_range(-self.angular_rate_limit..=self.angular_rate_limit),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WheelSimulator {
    min_speed: f64,
    max_speed: f64,
}

impl WheelSimulator {
    pub fn new(min_speed: f64, max_speed: f64) -> Self {
        Self {
            min_speed,
            max_speed,
        }
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> [f64; 4] {
        std::array::from_fn(|_| rng.gen_range(self.min_speed..=self.max_speed))
    }
}

/// All simulators driven from one seedable random stream.
pub struct SimulatedSensorSource {
    rng: StdRng,
    motor: MotorSimulator,
    battery: BatterySimulator,
    imu: ImuSimulator,
    wheels: WheelSimulator,
}

impl SimulatedSensorSource {
    pub fn new(settings: &SimulationSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            rng,
            motor: MotorSimulator::new(settings.current_idle, settings.current_span),
            battery: BatterySimulator::new(settings),
            imu: ImuSimulator::new(
                settings.accel_noise,
                settings.gravity,
                settings.angular_rate_limit,
            ),
            wheels: WheelSimulator::new(settings.wheel_speed_min, settings.wheel_speed_max),
        }
    }
}

impl SensorSource for SimulatedSensorSource {
    fn sample(&mut self, dt: f64) -> Result<SensorFrame, SampleError> {
        let motor = self.motor.update(dt, &mut self.rng);
        let battery = self.battery.update(motor.current, dt);
        let imu = self.imu.sample(&mut self.rng);
        let wheel_speeds = self.wheels.sample(&mut self.rng);

        Ok(SensorFrame {
            motor,
            battery,
            imu,
            wheel_speeds,
        })
    }
}
