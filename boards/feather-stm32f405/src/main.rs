#![deny(unsafe_code)]
#![no_main]
#![no_std]

use defmt_rtt as _; // global logger
use panic_probe as _;
use rtic::app;
use rtic_monotonics::stm32::prelude::*;

mod clock;
mod config;
mod device_id;
mod network;
mod serial;
mod session_buffers;

stm32_tim2_monotonic!(Mono, 1_000_000);

#[app(device = embassy_stm32, peripherals = true, dispatchers = [USART1, USART2, UART4])]
mod app {
    use super::*;
    use defmt::{error, info, warn};
    use embassy_futures::join::join3;
    use embassy_stm32::exti::ExtiInput;
    use embassy_stm32::gpio::{Level, Output, Pull, Speed};
    use embassy_stm32::i2c::{self, I2c};
    use embassy_stm32::mode::Async;
    use embassy_stm32::peripherals;
    use embassy_stm32::rcc::{Hse, HseMode};
    use embassy_stm32::rng::{self, Rng};
    use embassy_stm32::spi::{self, Spi};
    use embassy_stm32::time::Hertz;
    use embassy_stm32::usart::UartTx;
    use embassy_time::{Delay, Timer};
    use heapless::String;
    use mpu6050::Mpu6050;
    use rand_core::RngCore;
    use static_cell::StaticCell;
    use telemetry_core::{BringUpError, OutputMode, OutputSink, Remote, TelemetryConfig, TelemetryLoop};

    use clock::EmbassyClock;
    use network::{EthPeripherals, EthernetLink, MqttSession};
    use serial::SerialPort;

    /// Pause before re-running a bring-up that failed on the network
    const BRING_UP_RETRY_MS: u64 = 5_000;

    type Sensor = Mpu6050<I2c<'static, Async>, Delay>;
    type Telemetry = TelemetryLoop<EmbassyClock, Sensor, SerialPort, EthernetLink, MqttSession>;

    type SpiPeripheral = embassy_stm32::Peri<'static, peripherals::SPI2>;
    type PinPB13 = embassy_stm32::Peri<'static, peripherals::PB13>;
    type PinPB15 = embassy_stm32::Peri<'static, peripherals::PB15>;
    type PinPB14 = embassy_stm32::Peri<'static, peripherals::PB14>;
    type PinPC6 = embassy_stm32::Peri<'static, peripherals::PC6>;
    type PinPC3 = embassy_stm32::Peri<'static, peripherals::PC3>;
    type PinPC2 = embassy_stm32::Peri<'static, peripherals::PC2>;
    type ExtiChannel = embassy_stm32::Peri<'static, peripherals::EXTI2>;
    type DmaTx = embassy_stm32::Peri<'static, peripherals::DMA1_CH4>;
    type DmaRx = embassy_stm32::Peri<'static, peripherals::DMA1_CH3>;
    type RngPeripheral = embassy_stm32::Peri<'static, peripherals::RNG>;

    /// W5500 FeatherWing wiring; only brought up in publish mode
    struct NetworkPeripherals {
        spi: SpiPeripheral,
        sck: PinPB13,
        mosi: PinPB15,
        miso: PinPB14,
        cs: PinPC6,
        reset: PinPC3,
        int: PinPC2,
        exti: ExtiChannel,
        dma_tx: DmaTx,
        dma_rx: DmaRx,
        rng: RngPeripheral,
    }

    embassy_stm32::bind_interrupts!(struct Irqs {
        RNG => rng::InterruptHandler<peripherals::RNG>;
        I2C1_EV => i2c::EventInterruptHandler<peripherals::I2C1>;
        I2C1_ER => i2c::ErrorInterruptHandler<peripherals::I2C1>;
    });

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        led: Output<'static>,
    }

    #[init]
    fn init(_cx: init::Context) -> (Shared, Local) {
        info!("IMU telemetry node starting...");

        // Adafruit Feather STM32F405: 12 MHz HSE
        let mut config = embassy_stm32::Config::default();
        config.rcc.hse = Some(Hse {
            freq: Hertz(12_000_000),
            mode: HseMode::Oscillator,
        });

        // HSE (12 MHz) / PREDIV(6) = 2 MHz (PLL input)
        // 2 MHz * MUL(168) = 336 MHz (VCO)
        // VCO / DIVP(4) = 84 MHz (SYSCLK)
        // VCO / DIVQ(7) = 48 MHz (RNG)
        config.rcc.pll_src = embassy_stm32::rcc::PllSource::HSE;
        config.rcc.pll = Some(embassy_stm32::rcc::Pll {
            prediv: embassy_stm32::rcc::PllPreDiv::DIV6,
            mul: embassy_stm32::rcc::PllMul::MUL168,
            divp: Some(embassy_stm32::rcc::PllPDiv::DIV4),
            divq: Some(embassy_stm32::rcc::PllQDiv::DIV7),
            divr: None,
        });
        config.rcc.sys = embassy_stm32::rcc::Sysclk::PLL1_P;
        config.rcc.ahb_pre = embassy_stm32::rcc::AHBPrescaler::DIV1; // 84 MHz
        config.rcc.apb1_pre = embassy_stm32::rcc::APBPrescaler::DIV2; // 42 MHz
        config.rcc.apb2_pre = embassy_stm32::rcc::APBPrescaler::DIV1; // 84 MHz

        let p = embassy_stm32::init(config);
        info!("PLL configured: SYSCLK=84MHz, PLLQ=48MHz for RNG");

        // TIM2 on APB1: timer clock = 2*APB1 when prescaler != 1
        let timer_clock_hz = 84_000_000;
        Mono::start(timer_clock_hz);

        let led = Output::new(p.PC1, Level::High, Speed::Low);

        // MPU6050 on the Feather SCL/SDA pins
        let mut i2c_config = i2c::Config::default();
        i2c_config.frequency = Hertz(400_000);
        let i2c = I2c::new(
            p.I2C1, p.PB6, p.PB7, Irqs, p.DMA1_CH6, p.DMA1_CH0, i2c_config,
        );

        let serial = match UartTx::new_blocking(p.USART3, p.PB10, SerialPort::config()) {
            Ok(tx) => Some(SerialPort::new(tx)),
            Err(e) => {
                error!("Serial port setup failed: {:?}", e);
                None
            }
        };

        let net_periph = NetworkPeripherals {
            spi: p.SPI2,
            sck: p.PB13,
            mosi: p.PB15,
            miso: p.PB14,
            cs: p.PC6,
            reset: p.PC3,
            int: p.PC2,
            exti: p.EXTI2,
            dma_tx: p.DMA1_CH4,
            dma_rx: p.DMA1_CH3,
            rng: p.RNG,
        };

        heartbeat::spawn().ok();
        telemetry_task::spawn(i2c, serial, net_periph).ok();

        (Shared {}, Local { led })
    }

    /// Heartbeat task
    #[task(priority = 1, local = [led])]
    async fn heartbeat(cx: heartbeat::Context) {
        info!("Heartbeat task started");
        loop {
            cx.local.led.set_high();
            Mono::delay(100.millis()).await;
            cx.local.led.set_low();
            Mono::delay(4900.millis()).await;
        }
    }

    /// Telemetry task - owns the sensor, the sink and, in publish mode, the
    /// network stack
    ///
    /// Stack is !Send and must remain within this task.
    #[task(priority = 1)]
    async fn telemetry_task(
        _cx: telemetry_task::Context,
        i2c: I2c<'static, Async>,
        serial: Option<SerialPort>,
        periph: NetworkPeripherals,
    ) -> ! {
        let mut config = config::load();
        if config.client_id.is_empty() {
            static CLIENT_ID: StaticCell<String<{ device_id::CLIENT_ID_MAX_LEN }>> =
                StaticCell::new();
            config.client_id = CLIENT_ID.init(device_id::client_id()).as_str();
        }

        let sensor = Mpu6050::new(i2c, Delay);

        match config.output {
            OutputMode::Discard => {
                let telemetry = Telemetry::new(config, EmbassyClock, sensor, OutputSink::Discard);
                run_telemetry(telemetry).await
            }
            OutputMode::LocalText => {
                let sink = match serial {
                    Some(port) => OutputSink::LocalText(port),
                    None => {
                        warn!("No serial port; samples will be discarded");
                        OutputSink::Discard
                    }
                };
                run_telemetry(Telemetry::new(config, EmbassyClock, sensor, sink)).await
            }
            OutputMode::RemotePublish => run_remote(config, sensor, periph).await,
        }
    }

    /// Bring up the network stack and run telemetry alongside its runners
    async fn run_remote(config: TelemetryConfig, sensor: Sensor, periph: NetworkPeripherals) -> ! {
        info!("Network task started");

        let mut spi_config = spi::Config::default();
        spi_config.frequency = Hertz(10_000_000); // 10 MHz for W5500

        let spi = Spi::new(
            periph.spi,
            periph.sck,
            periph.mosi,
            periph.miso,
            periph.dma_tx,
            periph.dma_rx,
            spi_config,
        );

        let eth_periph = EthPeripherals {
            spi,
            cs: Output::new(periph.cs, Level::High, Speed::VeryHigh),
            reset: Output::new(periph.reset, Level::High, Speed::Low),
            int: ExtiInput::new(periph.int, periph.exti, Pull::Up),
        };

        let (device, w5500_runner) =
            match network::init_w5500(eth_periph, device_id::mac_address()).await {
                Ok(parts) => parts,
                Err(e) => {
                    error!("Ethernet bring-up failed: {}", e);
                    halt().await
                }
            };

        let mut rng = Rng::new(periph.rng, Irqs);
        info!("Hardware RNG initialized");

        let (stack, mut net_runner) = network::init_stack(device, rng.next_u64());

        let sink = OutputSink::RemotePublish(Remote {
            link: EthernetLink::new(stack),
            session: MqttSession::new(stack, rng, config.broker),
        });
        let telemetry = Telemetry::new(config, EmbassyClock, sensor, sink);

        let app = run_telemetry(telemetry);
        let (_, _, never) = join3(w5500_runner.run(), net_runner.run(), app).await;
        never
    }

    /// Bring-up with the board's failure policy, then the steady state
    async fn run_telemetry(mut telemetry: Telemetry) -> ! {
        loop {
            match telemetry.bring_up().await {
                Ok(()) => break,
                Err(BringUpError::SensorNotFound) => {
                    error!("Failed to find MPU6050 chip");
                    halt().await
                }
                Err(e) if e.is_fatal() => {
                    error!("Bring-up failed: {}", e);
                    halt().await
                }
                Err(e) => {
                    warn!("Bring-up failed: {}; retrying in {} ms", e, BRING_UP_RETRY_MS);
                    Timer::after_millis(BRING_UP_RETRY_MS).await;
                }
            }
        }

        telemetry.run().await
    }

    /// Park the calling task forever
    async fn halt() -> ! {
        loop {
            core::future::pending::<()>().await;
        }
    }

    /// RTIC idle task - WFI sleep mode when no tasks active
    #[idle]
    fn idle(_cx: idle::Context) -> ! {
        info!("Idle task started - entering WFI loop");
        loop {
            cortex_m::asm::wfi();
        }
    }
}
