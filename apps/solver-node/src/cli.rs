// [apps/solver-node/src/cli.rs]
/*!
 * =================================================================
 * APARATO: COMMAND DIRECTIVES (V4.0)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: SUPERFICIE CLI DEL NODO SOBERANO
 * =================================================================
 */

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Directivas de mando del nodo soberano Canguro.
#[derive(Parser, Debug)]
#[command(
    name = "canguro",
    author = "Raz Podesta <metaShark Tech>",
    version = "0.4.0",
    about = "Canguro Sovereign Node // Pollard Lambda ECDLP solver for secp256k1"
)]
pub struct CommandDirectives {
    /// Operación a ejecutar.
    #[command(subcommand)]
    pub operation: Operation,
}

/// Operaciones del nodo.
#[derive(Subcommand, Debug)]
pub enum Operation {
    /// Búsqueda local sobre el fichero de configuración de misión.
    Solve {
        /// Fichero de configuración (línea 1: `A B` hex; línea 2: clave pública hex).
        config_file: PathBuf,
        #[command(flatten)]
        checkpoint: CheckpointDirectives,
        #[command(flatten)]
        compute: ComputeDirectives,
        /// Fichero donde sellar la clave privada recuperada.
        #[arg(short = 'o', long = "output")]
        key_output: Option<PathBuf>,
        /// Cota de abandono: detener tras `max_step × ops esperadas`.
        #[arg(long = "max-step", default_value_t = 0.0)]
        max_step: f64,
    },

    /// Servidor de coordinación: bóveda canónica + ingesta DP del enjambre.
    Server {
        /// Fichero de configuración de la misión.
        config_file: PathBuf,
        /// Puerto TCP de escucha.
        #[arg(short = 's', long = "port", env = "CANGURO_PORT", default_value_t = 17403)]
        port: u16,
        #[command(flatten)]
        checkpoint: CheckpointDirectives,
        /// Forzar el tamaño DP (si no, auto o el del fichero cargado).
        #[arg(short = 'd', long = "dp")]
        dp_size: Option<u32>,
        /// Fichero donde sellar la clave privada recuperada.
        #[arg(short = 'o', long = "output")]
        key_output: Option<PathBuf>,
    },

    /// Cliente de enjambre: caminatas locales, DPs al servidor.
    Client {
        /// Dirección `ip:puerto` del servidor de coordinación.
        #[arg(short = 's', long = "server", env = "CANGURO_SERVER")]
        server_address: String,
        #[command(flatten)]
        compute: ComputeDirectives,
        /// Fichero de checkpoint HEADK (solo estado de canguros).
        #[arg(short = 'w', long = "work-file")]
        work_file: Option<PathBuf>,
        /// Fichero HEADK desde el cual reanudar.
        #[arg(short = 'i', long = "input-work")]
        input_work: Option<PathBuf>,
        /// Periodo de checkpoint en segundos.
        #[arg(long = "wi", default_value_t = 60)]
        save_period_seconds: u64,
        /// Timeout de red en milisegundos (reintento con retroceso).
        #[arg(long = "ntimeout", default_value_t = 3000)]
        network_timeout_ms: u64,
        /// Etiqueta del nodo en el registro del servidor.
        #[arg(long = "label", env = "CANGURO_WORKER_LABEL", default_value = "canguro-node-alpha")]
        worker_label: String,
    },

    /// Fusión por pares: file1 + file2 → dest.
    Merge {
        /// Primer fichero de trabajo (HEADW).
        file1: PathBuf,
        /// Segundo fichero de trabajo (HEADW).
        file2: PathBuf,
        /// Artefacto destino.
        dest: PathBuf,
    },

    /// Fusión N-aria de un directorio: el mayor absorbe al resto.
    MergeDir {
        /// Directorio con ficheros de trabajo.
        directory: PathBuf,
        /// Artefacto destino.
        dest: PathBuf,
    },

    /// Volcado de cabecera y estadísticas de un fichero de trabajo.
    Info {
        /// Fichero de trabajo (HEADW).
        file: PathBuf,
    },

    /// Exportación textual de la tabla a tame.txt / wild.txt.
    Export {
        /// Fichero de trabajo (HEADW).
        file: PathBuf,
        /// Destino de los registros TAME.
        #[arg(long = "tame", default_value = "tame.txt")]
        tame_output: PathBuf,
        /// Destino de los registros WILD.
        #[arg(long = "wild", default_value = "wild.txt")]
        wild_output: PathBuf,
    },
}

/// Directivas de checkpoint compartidas por solve y server.
#[derive(clap::Args, Debug, Clone)]
pub struct CheckpointDirectives {
    /// Fichero de trabajo para los checkpoints.
    #[arg(short = 'w', long = "work-file")]
    pub work_file: Option<PathBuf>,
    /// Fichero de trabajo desde el cual reanudar.
    #[arg(short = 'i', long = "input-work")]
    pub input_work: Option<PathBuf>,
    /// Sufijar cada guardado con marca de tiempo (y vaciar la tabla).
    #[arg(long = "wsplit")]
    pub wsplit: bool,
    /// Periodo de checkpoint en segundos.
    #[arg(long = "wi", default_value_t = 60)]
    pub save_period_seconds: u64,
    /// Cota de espera del estacionamiento de caminantes (ms).
    #[arg(long = "wtimeout", default_value_t = 3000)]
    pub save_timeout_ms: u64,
    /// Serializar también el estado de los canguros en cada checkpoint.
    #[arg(long = "kangaroo")]
    pub save_kangaroos: bool,
}

/// Directivas de cómputo compartidas por solve y client.
#[derive(clap::Args, Debug, Clone)]
pub struct ComputeDirectives {
    /// Forzar el tamaño DP (si no, selección automática).
    #[arg(short = 'd', long = "dp")]
    pub dp_size: Option<u32>,
    /// Hilos CPU de caminata (por defecto, núcleos disponibles).
    #[arg(short = 't', long = "threads")]
    pub threads: Option<usize>,
    /// Canguros por manada (lote de inversión compartida).
    #[arg(long = "grp", default_value_t = 128)]
    pub group_size: usize,
    /// Explotar la simetría (x, y) ≡ (x, -y) del grupo.
    #[arg(long = "sym")]
    pub use_symmetry: bool,
    /// Activar el motor GPU (requiere build con el estrato GPU enlazado).
    #[arg(long = "gpu")]
    pub use_gpu: bool,
    /// Geometría de la rejilla GPU `gridX,gridY`.
    #[arg(short = 'g', long = "grid")]
    pub gpu_grid: Option<String>,
    /// Identificadores de GPU a reclamar (lista separada por comas).
    #[arg(long = "gpu-id")]
    pub gpu_ids: Option<String>,
}
