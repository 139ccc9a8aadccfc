mod winit;

pub use self::winit::WinitTranslator;
