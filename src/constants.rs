// UI Constants
pub const APP_TITLE: &str = "Mi Asistente";
pub const INPUT_PLACEHOLDER: &str = "Pregunta sobre la carrera de Sistemas Computacionales...";
pub const WAITING_PLACEHOLDER: &str = "Esperando respuesta...";
pub const SUGGESTIONS_HEADING: &str = "O inicia con una pregunta común:";

/// Shortcut questions offered while the log holds only the seed greeting.
/// Each entry is `(label, question)`.
pub const SUGGESTIONS: [(&str, &str); 3] = [
    (
        "Oferta de Especialidades",
        "Hablame sobre las especialidades de la carrera",
    ),
    (
        "Oportunidades Laborales",
        "¿Cuáles son las oportunidades laborales que hay en la carrera?",
    ),
    ("Proceso de Admisión", "¿Cuál es el proceso de admisión?"),
];

// Conversation texts
pub const GREETING: &str =
    "¡Hola! Soy el chatbot de la carrera de Sistemas Computacionales. ¿Cómo puedo ayudarte el día de hoy?";
pub const INIT_FAILURE_PREFIX: &str = "Error: No se ha podido iniciar el chatbot.";
pub const SEND_FAILURE_PREFIX: &str = "Lo sentimos, algo ha salido mal.";
pub const SEND_FAILURE_BANNER: &str = "Falló al obtener respuesta del modelo.";
pub const MISSING_API_KEY: &str = "API_KEY no ha sido declarada";
pub const LOAD_FAILURE: &str = "Ocurrió un error al cargar la información de la universidad.";

// API Constants
pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_API_VERSION: &str = "v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

// Context Constants
pub const DEFAULT_CONTEXT_SOURCE: &str = "data/informacion-universidad.json";
pub const DEFAULT_INSTITUTION: &str = "Instituto Tecnológico Superior de Cajeme";
