// Built-in prompts and system-prompt assembly

use crate::models::{EpicItem, GenerationKind, RequirementItem};
use tera::{Context, Tera};

/// Template name registered with the engine
const SYSTEM_PROMPT: &str = "system_prompt";

/// Base prompt for functional requirement generation
pub const FUNCTIONAL_REQUIREMENTS_PROMPT: &str =
    "Imagina que eres un SCRUM Master con 20 años de experiencia en metodologías Agile. \
     Tu tarea es generar requisitos funcionales detallados y específicos basados en \
     la descripción del proyecto que se te proporcionará. Debes ser conciso y evitar redundancias. \
     Responde únicamente cuando recibas una descripción clara y válida de un proyecto de software. \
     Si la descripción del proyecto es insuficiente para generar los requerimientos, pide detalles \
     específicos que falten. Por ejemplo, si necesitas más información sobre los usuarios finales \
     del sistema o los objetivos específicos del proyecto, indícalo claramente. Presenta los \
     requerimientos en una lista clara. Basate en el siguiente ejemplo: \
     1. Inicio de sesión de usuario: El sistema debe permitir a los usuarios iniciar sesión utilizando un nombre de usuario y contraseña válidos. \
     2. Procesamiento de Negocios: El sistema debe procesar los pagos con tarjeta de crédito y proporcionar a los usuarios un recibo cuando las transacciones sean exitosas.";

/// Base prompt for non-functional requirement generation
pub const NON_FUNCTIONAL_REQUIREMENTS_PROMPT: &str =
    "Imagina que eres un SCRUM Master con 20 años de experiencia en metodologías Agile. \
     Tu tarea es generar requisitos no funcionales detallados y específicos basados en \
     la descripción del proyecto que se te proporcionará. Debes ser conciso y evitar redundancias. \
     Responde únicamente cuando recibas una descripción clara y válida de un proyecto de software. \
     Si la descripción del proyecto es insuficiente para generar los requerimientos, pide detalles \
     específicos que falten. Por ejemplo, si necesitas más información sobre los usuarios finales \
     del sistema o los objetivos específicos del proyecto, indícalo claramente. Presenta los \
     requerimientos en una lista clara. Basate en el siguiente ejemplo: \
     Velocidad de rendimiento: El sistema debe procesar las solicitudes de los usuarios en un plazo promedio de 2 segundos, incluso con mucho tráfico de usuarios. \
     Disponibilidad del sistema: El sistema debe mantener un tiempo de actividad del 99.9 % para garantizar que los usuarios tengan acceso constante.";

/// Base prompt for epic generation
pub const EPICS_PROMPT: &str =
    "Imagina que eres un Product Owner con amplia experiencia en metodologías Agile, \
     especialmente en Scrum. Tu tarea es formular épicas claras y comprensivas que resuman grandes \
     áreas de funcionalidad basadas en los requerimientos que te daran del proyecto. Estos \
     requerimientos abarcan las necesidades estratégicas y funcionales del negocio, y tu objetivo \
     es asegurar que las épicas reflejen estos objetivos de alto nivel de una manera que guíe \
     efectivamente el desarrollo del proyecto. Debes ser conciso y evitar detalles técnicos \
     profundos, ya que las épicas deben ser lo suficientemente amplias para abarcar varias \
     historias de usuario pero específicas para dirigir el desarrollo. Las épicas deben \
     presentarse en una lista clara, proporcionando un marco que pueda desglosarse en historias \
     de usuario más detalladas durante las fases de sprint.";

/// Base prompt for user story generation
pub const USER_STORY_PROMPT: &str =
    "Imagina que eres un Product Owner con experiencia en metodologías ágiles. \
     Tu tarea es generar historias de usuario claras y accionables a partir de las épicas del sistema. \
     Cada historia de usuario debe tener el siguiente formato:\n\
     - id: US-###\n\
     - title: título breve y descriptivo\n\
     - description: 'Como [tipo de usuario], quiero [objetivo] para [beneficio]'\n\
     - priority: Alta, Media o Baja\n\
     - acceptance_criteria: lista de criterios de aceptación\n\
     - assigned_epic: ID de la épica asociada (formato EPIC-###)";

/// System prompt skeleton shared by every generation kind. Context values
/// are injected as data; history never passes through the template.
const SYSTEM_PROMPT_TEMPLATE: &str = "\
{{ preprompt }} Use the following information to deepen and enrich your response or as a base to build your answer:

{{ context }}

Generate your response in the following structured JSON format. Always make sure to include the 'status' field:

{{ format_instructions }}

IMPORTANT: The 'status' field is MANDATORY and must be one of the following values:
{{ status_rules }}
- If asked for anything that is not a software project, respond exactly with:
- 'As a virtual assistant, I cannot provide a response for that. I can only assist with software project support.'
Finally, always respond in the same language you are addressed in.
";

/// JSON shape instructions per generation kind
fn format_instructions(kind: GenerationKind) -> &'static str {
    match kind {
        GenerationKind::Requirements => {
            "The output must be a JSON object with the fields: status (string), \
             content (list of requirement objects, or a string when no requirements apply), \
             missing_info (list of strings or null), metadata (object or null). \
             Each requirement object has: id, title, description, \
             category ('Funcional' or 'No Funcional'), priority ('Alta', 'Media' or 'Baja')."
        }
        GenerationKind::Epics => {
            "The output must be a JSON object with the fields: status (string), \
             content (list of epic objects, or a string when no epics apply), \
             missing_info (list of strings or null), metadata (object or null). \
             Each epic object has: id, title, description, \
             related_requirements (list of objects with id and description)."
        }
        GenerationKind::UserStories => {
            "The output must be a JSON object with the fields: status (string), \
             content (list of user story objects, or a string when no stories apply), \
             missing_info (list of strings or null), metadata (object or null). \
             Each user story object has: id, title, description, \
             priority ('Alta', 'Media' or 'Baja'), assigned_epic, \
             acceptance_criteria (list of strings)."
        }
    }
}

/// Status vocabulary rules per generation kind
fn status_rules(kind: GenerationKind) -> &'static str {
    match kind {
        GenerationKind::Requirements => {
            "- 'REQUERIMIENTOS_GENERADOS' if you can generate requirements based on the project description. Always use the fields id (REQ-### for functional and REQ-NF-### for non-functional), title, description, category (functional or non-functional depending on the type), and priority (High, Medium, Low)\n\
             - 'INFORMACION_INSUFICIENTE' if you believe more information is needed, and list it under the 'missing_info' field\n\
             - 'ERROR_PROCESAMIENTO' if an error occurs\n\
             - 'RESPUESTA_GENERAL' for any answer outside of those attributes\n"
        }
        GenerationKind::Epics => {
            "- 'EPICAS_GENERADAS' if you can generate epics based on the available requirements. Always use the fields id (EPIC-###), title, description, and related_requirements, where you list the requirement IDs (REQ-### for functional and REQ-NF-### for non-functional) along with their descriptions in a list\n\
             - 'INFORMACION_INSUFICIENTE' if you believe more information is needed, and list it under the 'missing_info' field\n\
             - 'ERROR_PROCESAMIENTO' if an error occurs\n\
             - 'RESPUESTA_GENERAL' for any answer outside of those attributes\n"
        }
        GenerationKind::UserStories => {
            "- 'HISTORIAS_GENERADAS' if you can generate user stories based on the available epics. Always use the fields id (US-###), title, description, priority (High, Medium, Low), and assigned_epic (EPIC-###) for the associated epic. Also include the acceptance_criteria field as a list of acceptance criteria for the user story\n\
             - 'INFORMACION_INSUFICIENTE' if you believe more information is needed, and list it under the 'missing_info' field\n\
             - 'ERROR_PROCESAMIENTO' if an error occurs\n\
             - 'RESPUESTA_GENERAL' for any answer outside of those attributes\n"
        }
    }
}

/// Default base prompt for a generation kind. The requirements workflow
/// overrides this per sub-call (functional vs non-functional).
pub fn base_prompt(kind: GenerationKind) -> &'static str {
    match kind {
        GenerationKind::Requirements => FUNCTIONAL_REQUIREMENTS_PROMPT,
        GenerationKind::Epics => EPICS_PROMPT,
        GenerationKind::UserStories => USER_STORY_PROMPT,
    }
}

/// The user-turn text sent with every completion call
pub fn user_prompt(query: &str) -> String {
    format!("Pregunta: {}", query)
}

/// Render a requirement list as generation input for the epics flow
pub fn format_requirements_input(requirements: &[RequirementItem]) -> String {
    let mut formatted = String::new();
    for requirement in requirements {
        formatted.push_str(&format!(
            "- ({}) {}: {}\n",
            requirement.id, requirement.title, requirement.description
        ));
    }
    formatted
}

/// Render an epic batch as generation input for the user-story flow
pub fn format_epic_group_input(epics: &[EpicItem]) -> String {
    let mut formatted = String::new();
    for epic in epics {
        formatted.push_str(&format!(
            "EPIC: {} ({})\nDescripción: {}\nRequerimientos:\n",
            epic.title, epic.id, epic.description
        ));
        for requirement in &epic.related_requirements {
            formatted.push_str(&format!("- {}: {}\n", requirement.id, requirement.description));
        }
        formatted.push('\n');
    }
    formatted
}

/// Tera-backed renderer for the system prompt
pub struct PromptEngine {
    tera: Tera,
}

impl PromptEngine {
    pub fn new() -> Result<Self, String> {
        let mut tera = Tera::default();
        tera.add_raw_template(SYSTEM_PROMPT, SYSTEM_PROMPT_TEMPLATE)
            .map_err(|e| format!("Failed to register system prompt template: {}", e))?;
        Ok(PromptEngine { tera })
    }

    /// Assemble the system prompt for one generation call
    pub fn render_system_prompt(
        &self,
        kind: GenerationKind,
        preprompt: &str,
        context_chunks: &[String],
    ) -> Result<String, String> {
        let mut context = Context::new();
        context.insert("preprompt", preprompt);
        context.insert("context", &context_chunks.join("\n\n"));
        context.insert("format_instructions", format_instructions(kind));
        context.insert("status_rules", status_rules(kind));

        self.tera
            .render(SYSTEM_PROMPT, &context)
            .map_err(|e| format!("Failed to render system prompt: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, RelatedRequirement, RequirementCategory};

    #[test]
    fn test_render_system_prompt_includes_parts() {
        let engine = PromptEngine::new().unwrap();
        let rendered = engine
            .render_system_prompt(
                GenerationKind::Requirements,
                FUNCTIONAL_REQUIREMENTS_PROMPT,
                &["chunk uno".to_string(), "chunk dos".to_string()],
            )
            .unwrap();

        assert!(rendered.starts_with("Imagina que eres un SCRUM Master"));
        assert!(rendered.contains("chunk uno\n\nchunk dos"));
        assert!(rendered.contains("REQUERIMIENTOS_GENERADOS"));
        assert!(rendered.contains("INFORMACION_INSUFICIENTE"));
        assert!(rendered.contains("respond in the same language"));
    }

    #[test]
    fn test_render_per_kind_status_rules() {
        let engine = PromptEngine::new().unwrap();

        let epics = engine
            .render_system_prompt(GenerationKind::Epics, EPICS_PROMPT, &[])
            .unwrap();
        assert!(epics.contains("EPICAS_GENERADAS"));
        assert!(epics.contains("EPIC-###"));

        let stories = engine
            .render_system_prompt(GenerationKind::UserStories, USER_STORY_PROMPT, &[])
            .unwrap();
        assert!(stories.contains("HISTORIAS_GENERADAS"));
        assert!(stories.contains("US-###"));
    }

    #[test]
    fn test_context_with_braces_is_safe() {
        // Retrieved chunks may contain JSON braces; they are injected as
        // data, never re-parsed as template text
        let engine = PromptEngine::new().unwrap();
        let rendered = engine
            .render_system_prompt(
                GenerationKind::Requirements,
                "preprompt",
                &["{\"ejemplo\": {{raro}} }".to_string()],
            )
            .unwrap();
        assert!(rendered.contains("{\"ejemplo\": {{raro}} }"));
    }

    #[test]
    fn test_user_prompt() {
        assert_eq!(user_prompt("describe el sistema"), "Pregunta: describe el sistema");
    }

    #[test]
    fn test_format_requirements_input() {
        let requirements = vec![RequirementItem {
            id: "REQ-001".to_string(),
            title: "Inicio de sesión".to_string(),
            description: "El sistema permite iniciar sesión".to_string(),
            category: Some(RequirementCategory::Functional),
            priority: Some(Priority::High),
        }];
        assert_eq!(
            format_requirements_input(&requirements),
            "- (REQ-001) Inicio de sesión: El sistema permite iniciar sesión\n"
        );
    }

    #[test]
    fn test_format_epic_group_input() {
        let epics = vec![EpicItem {
            id: "EPIC-001".to_string(),
            title: "Gestión de usuarios".to_string(),
            description: "Todo lo relativo a cuentas".to_string(),
            related_requirements: vec![RelatedRequirement {
                id: "REQ-001".to_string(),
                description: "Inicio de sesión".to_string(),
            }],
        }];
        let formatted = format_epic_group_input(&epics);
        assert!(formatted.starts_with("EPIC: Gestión de usuarios (EPIC-001)\n"));
        assert!(formatted.contains("Descripción: Todo lo relativo a cuentas\n"));
        assert!(formatted.contains("- REQ-001: Inicio de sesión\n"));
        assert!(formatted.ends_with("\n\n"));
    }
}
